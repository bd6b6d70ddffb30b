use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hs_core::{Exclusion, MatchTier, RegexRewrite, Rule, RuleCollection, Ruleset};

fn build_collection() -> RuleCollection {
    let mut collection = RuleCollection::new();

    let exact: Vec<String> = (0..20_000).map(|i| format!("site{i}.example.com")).collect();
    let subdomains: Vec<String> = (0..20_000).map(|i| format!("domain{i}.org")).collect();
    collection.add_simple_hosts(&exact, MatchTier::Exact);
    collection.add_simple_hosts(&subdomains, MatchTier::IncludeSubdomains);

    for i in 0..2_000 {
        let rule = Rule::combine(
            [Exclusion::new(format!("^http://custom{i}\\.net/static/"))],
            [Rule::from(RegexRewrite::new(
                format!("^http://(www\\.)?custom{i}\\.net/"),
                format!("https://secure.custom{i}.net/"),
            ))],
        );
        collection.add_ruleset(Ruleset::new(
            [format!("custom{i}.net"), format!("*.custom{i}.net")],
            rule,
        ));
    }

    collection
}

fn bench_rewrite(c: &mut Criterion) {
    let collection = build_collection();

    c.bench_function("rewrite_exact_simple", |b| {
        b.iter(|| collection.rewrite(black_box("http://site1234.example.com/index.html")))
    });

    c.bench_function("rewrite_subdomain_walk", |b| {
        b.iter(|| collection.rewrite(black_box("http://a.b.c.domain777.org/path?q=1")))
    });

    c.bench_function("rewrite_regex_rule", |b| {
        b.iter(|| collection.rewrite(black_box("http://www.custom42.net/login")))
    });

    c.bench_function("rewrite_deep_unknown_host", |b| {
        b.iter(|| collection.rewrite(black_box("http://a.b.c.d.e.f.g.h.i.j.unknown.test/")))
    });

    c.bench_function("rewrite_https_passthrough", |b| {
        b.iter(|| collection.rewrite(black_box("https://site1.example.com/")))
    });
}

criterion_group!(benches, bench_rewrite);
criterion_main!(benches);
