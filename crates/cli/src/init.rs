use std::env;
use std::fs;
use std::path::Path;

use crate::log;
use crate::report::{Error, ErrorExt, Report};
use crate::Init;

pub fn init(init: &Init) -> Report<()> {
    let path = match &init.path {
        Some(path) => path.clone(),
        None => env::current_dir().message("failed to get current directory")?,
    };

    let cargo_path = path.join("Cargo.toml");
    if cargo_path.is_file() {
        return Err(Error::message(
            "`tally init` cannot be run on existing Cargo packages",
        ));
    }

    let name = package_name(init.name.as_deref(), &path)?;

    log::creating!("tally package `{name}` in {}", path.display());

    write_file(&cargo_path, &make_cargo_toml(name))?;
    write_file(&path.join("index.html"), include_str!("../init/index.html"))?;
    write_file(&path.join("src/lib.rs"), include_str!("../init/lib.rs"))?;

    Ok(())
}

fn package_name<'a>(name: Option<&'a str>, path: &'a Path) -> Report<&'a str> {
    if let Some(name) = name {
        return Ok(name);
    }

    path.file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            Error::message(format!(
                "cannot auto-detect package name from path \"{}\"; use --name to override",
                path.display(),
            ))
        })
}

fn write_file(path: &Path, contents: &str) -> Report<()> {
    if path.is_file() {
        log::info!("skipping existing {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).message("failed to create parent directories")?;
    }

    fs::write(path, contents).with_message(|| format!("failed to create {}", path.display()))
}

fn make_cargo_toml(name: &str) -> String {
    let template = include_str!("../init/Cargo.toml");
    let tally_version = env!("CARGO_PKG_VERSION");

    let mut out = String::with_capacity(template.len());

    // Keys are wrapped in colons, so every odd chunk is a key
    for (n, chunk) in template.split(':').enumerate() {
        if n % 2 == 0 {
            out.push_str(chunk);
            continue;
        }

        match chunk {
            "NAME" => out.push_str(name),
            "TALLY_VERSION" => out.push_str(tally_version),
            _ => unreachable!("undefined template key `{chunk}`"),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("tally-init-{name}-{}", std::process::id()));

        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn cargo_toml_template() {
        let toml = make_cargo_toml("my_counter");

        assert!(toml.contains(r#"name = "my_counter""#));
        assert!(toml.contains(&format!(
            r#"tally = {{ version = "{}", features = ["rlsf"] }}"#,
            env!("CARGO_PKG_VERSION")
        )));
        assert!(!toml.contains(':'));
    }

    #[test]
    fn name_from_flag_or_directory() {
        let path = Path::new("/home/me/counter");

        assert_eq!(package_name(Some("other"), path).unwrap(), "other");
        assert_eq!(package_name(None, path).unwrap(), "counter");
        assert!(package_name(None, Path::new("/")).is_err());
    }

    #[test]
    fn scaffolds_a_new_crate() {
        let dir = scratch("new");

        init(&Init {
            path: Some(dir.clone()),
            name: Some("clicker".into()),
        })
        .unwrap();

        let toml = fs::read_to_string(dir.join("Cargo.toml")).unwrap();

        assert!(toml.contains(r#"name = "clicker""#));
        assert!(dir.join("index.html").is_file());
        assert!(fs::read_to_string(dir.join("src/lib.rs"))
            .unwrap()
            .contains("tally::start!"));
    }

    #[test]
    fn refuses_existing_package() {
        let dir = scratch("existing");
        fs::write(dir.join("Cargo.toml"), "[package]").unwrap();

        let err = init(&Init {
            path: Some(dir.clone()),
            name: None,
        })
        .unwrap_err();

        assert!(err.to_string().contains("existing Cargo packages"));
        assert_eq!(fs::read_to_string(dir.join("Cargo.toml")).unwrap(), "[package]");
        assert!(!dir.join("src").exists());
    }

    #[test]
    fn keeps_existing_files() {
        let dir = scratch("keep");
        fs::write(dir.join("index.html"), "<mine>").unwrap();

        init(&Init {
            path: Some(dir.clone()),
            name: Some("keep".into()),
        })
        .unwrap();

        assert_eq!(fs::read_to_string(dir.join("index.html")).unwrap(), "<mine>");
        assert!(dir.join("Cargo.toml").is_file());
    }
}
