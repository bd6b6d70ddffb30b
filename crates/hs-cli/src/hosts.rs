use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write one host per line, creating parent directories as needed.
pub fn write_hosts_file(path: &Path, hosts: &[&str]) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }

    let file = fs::File::create(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    for host in hosts {
        writeln!(writer, "{}", host)
            .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    }
    writer
        .flush()
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_hosts_file() {
        let dir = std::env::temp_dir().join(format!("hs-cli-hosts-{}", std::process::id()));
        let path = dir.join("nested").join("hosts.txt");

        write_hosts_file(&path, &["a.example", "b.example"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a.example\nb.example\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
