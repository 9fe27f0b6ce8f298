use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{absolute, Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use lol_html::html_content::{ContentType, Element};
use lol_html::{element, rewrite_str, RewriteStrSettings};

use crate::config::Config;
use crate::report::{Error, ErrorExt, Report};
use crate::{js, log, serve, wasm};

/// Compile the crate in the current directory and write the bundle into `config.dist`.
///
/// `generation` is embedded in `index.html` for the autoreload script to compare
/// against what the development server reports.
pub fn build(config: &Config, generation: u64) -> Report<()> {
    log::building!("{} v{}", config.crate_name, config.crate_version);

    let start = Instant::now();

    build_wasm(config.release)?;

    let target = config.cargo_wasm();

    if !target.exists() {
        return Err(Error::message(format!(
            "couldn't find compiled .wasm: {}",
            target.display(),
        )));
    }

    run_wasm_bindgen(&target, &config.dist, &config.filename)?;

    let wasm = config.bundle_wasm();
    let js = config.bundle_js();

    if config.release {
        let start = Instant::now();

        optimize_wasm(&wasm)?;
        js::minify_file(&js)?;

        let elapsed = start.elapsed();
        let wasm_path = absolute(&wasm).message("failed to get absolute path")?;
        log::optimized!("wasm `{}` in {elapsed:.2?}", wasm_path.display());
    }

    let wasm_bytes =
        fs::read(&wasm).with_message(|| format!("failed to read {}", wasm.display()))?;
    let summary = wasm::inspect(&wasm_bytes)
        .map_err_into_io()
        .with_message(|| format!("invalid wasm in {}", wasm.display()))?;

    log::info!("{}: {summary}", wasm.display());

    let snippets_dir = config.dist.join("snippets");
    let snippets = if snippets_dir.is_dir() {
        read_file_paths(&snippets_dir)
            .with_message(|| format!("failed to read {} directory", snippets_dir.display()))?
    } else {
        Vec::new()
    };

    make_index_html(MakeIndex {
        orig_index: Path::new("index.html"),
        index: &config.dist.join("index.html"),
        paths: Paths {
            dist: &config.dist,
            snippets: &snippets,
            wasm: &wasm,
            js: &js,
        },
        autoreload: config.autoreload.then_some(generation),
    })?;

    let js_path = absolute(&js).message("failed to get absolute path")?;
    log::finished!("`{}` in {:.2?}", js_path.display(), start.elapsed());

    Ok(())
}

fn build_wasm(release: bool) -> Report<()> {
    let mut cargo = Command::new("cargo");
    cargo.args(["build", "--target=wasm32-unknown-unknown"]);

    if release {
        cargo.arg("--release");
    }

    let status = cargo
        .spawn()
        .message("failed to run cargo")?
        .wait()
        .message("failed to build cargo crate")?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::message("failed to build cargo crate"))
    }
}

fn run_wasm_bindgen(target: &Path, dist: &Path, filename: &str) -> Report<()> {
    let out = Command::new("wasm-bindgen")
        .arg(target)
        .arg("--out-dir")
        .arg(dist)
        .arg("--out-name")
        .arg(filename)
        .args(["--target=web", "--no-typescript"])
        .output()
        .message("failed to run wasm-bindgen")?;

    if out.status.success() {
        Ok(())
    } else {
        let err = String::from_utf8_lossy(&out.stderr);
        Err(Error::message(format!("failed to run wasm-bindgen\n{err}")))
    }
}

fn optimize_wasm(file: &Path) -> Report<()> {
    let status = Command::new("wasm-opt")
        .arg("-Os")
        .arg(file)
        .arg("-o")
        .arg(file)
        .args(["--enable-simd", "--low-memory-unused"])
        .spawn()
        .message("failed to run wasm-opt")?
        .wait()
        .message("failed to optimize wasm")?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::message("failed to optimize wasm"))
    }
}

fn read_file_paths(path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = vec![];
    let mut to_visit = vec![Cow::Borrowed(path)];
    while let Some(dir) = to_visit.pop() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_file() {
                paths.push(entry.path());
            } else if file_type.is_dir() {
                to_visit.push(Cow::Owned(entry.path()));
            }
        }
    }

    Ok(paths)
}

struct Paths<'path> {
    dist: &'path Path,
    snippets: &'path [PathBuf],
    wasm: &'path Path,
    js: &'path Path,
}

impl Paths<'_> {
    /// Absolute URL of a file inside `dist`.
    fn url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(self.dist).unwrap_or(path);
        let mut url = String::new();

        for component in relative.components() {
            url.push('/');
            url.push_str(&component.as_os_str().to_string_lossy());
        }

        url
    }

    fn head(&self) -> String {
        let js_link = |p: &Path| {
            format!(
                r#"<link rel="modulepreload" href="{}" crossorigin=anonymous>"#,
                self.url(p),
            )
        };

        let mut head = js_link(self.js);

        head.push_str(&format!(
            r#"<link rel="preload" href="{}" crossorigin=anonymous as="fetch" type="application/wasm">"#,
            self.url(self.wasm),
        ));

        for snippet in self.snippets {
            if snippet.extension().is_some_and(|ext| ext == "js") {
                head.push_str(&js_link(snippet.as_path()));
            }
        }

        head
    }

    fn body(&self, autoreload: Option<u64>) -> String {
        let mut body = format!(
            "<script type=\"module\">\n\
                import init from '{}';\n\
                await init({{ module_or_path: '{}' }});\n\
            </script>\n",
            self.url(self.js),
            self.url(self.wasm),
        );

        if let Some(generation) = autoreload {
            body.push_str(&format!(
                "<script>\nconst TALLY_BUILD = '{generation}';\nconst TALLY_ENDPOINT = '{}';\n",
                serve::BUILD_ENDPOINT,
            ));
            body.push_str(include_str!("../reload.js"));
            body.push_str("</script>\n");
        }

        body
    }
}

struct MakeIndex<'path> {
    orig_index: &'path Path,
    index: &'path Path,
    paths: Paths<'path>,
    autoreload: Option<u64>,
}

fn make_index_html(m: MakeIndex) -> Report<()> {
    let MakeIndex {
        orig_index,
        index,
        paths,
        autoreload,
    } = m;

    let html = fs::read_to_string(orig_index)
        .or_else(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                Ok(include_str!("../init/index.html").to_owned())
            } else {
                Err(err)
            }
        })
        .with_message(|| format!("failed to read {}", orig_index.display()))?;

    let html_new = rewrite_index(
        &html,
        &paths.head(),
        &paths.body(autoreload),
    )
    .map_err(|err| Error::message(format!("{err} in {}", orig_index.display())))?;

    fs::write(index, html_new)
        .with_message(|| format!("failed to write {} file", index.display()))?;

    Ok(())
}

/// Append `head` to the first `<head>` tag and `body` to the first `<body>` tag.
fn rewrite_index(html: &str, head: &str, body: &str) -> Report<String> {
    let mut embed_head = Some(|el: &mut Element| el.append(head, ContentType::Html));
    let mut embed_body = Some(|el: &mut Element| el.append(body, ContentType::Html));

    let settings = RewriteStrSettings {
        element_content_handlers: vec![
            element!("head", |el| {
                if let Some(f) = embed_head.take() {
                    f(el);
                }

                Ok(())
            }),
            element!("body", |el| {
                if let Some(f) = embed_body.take() {
                    f(el);
                }

                Ok(())
            }),
        ],
        ..RewriteStrSettings::new()
    };

    let html_new = rewrite_str(html, settings)
        .map_err_into_io()
        .message("failed to rewrite html")?;

    if embed_head.is_some() {
        return Err(Error::message("<head> tag not found"));
    }

    if embed_body.is_some() {
        return Err(Error::message("<body> tag not found"));
    }

    Ok(html_new)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "<!DOCTYPE html>\n<html><head><title>t</title></head><body><div id=\"app\"></div></body></html>";

    fn paths<'a>(snippets: &'a [PathBuf]) -> Paths<'a> {
        Paths {
            dist: Path::new("dist"),
            snippets,
            wasm: Path::new("dist/app_bg.wasm"),
            js: Path::new("dist/app.js"),
        }
    }

    #[test]
    fn urls_are_rooted_in_dist() {
        let paths = paths(&[]);

        assert_eq!(paths.url(Path::new("dist/app.js")), "/app.js");
        assert_eq!(
            paths.url(Path::new("dist/snippets/x-1/inline0.js")),
            "/snippets/x-1/inline0.js"
        );
    }

    #[test]
    fn head_links() {
        let snippets = [
            PathBuf::from("dist/snippets/a/inline0.js"),
            PathBuf::from("dist/snippets/a/style.css"),
        ];
        let head = paths(&snippets).head();

        assert!(head.contains(r#"<link rel="modulepreload" href="/app.js" crossorigin=anonymous>"#));
        assert!(head.contains(r#"href="/app_bg.wasm""#));
        assert!(head.contains(r#"href="/snippets/a/inline0.js""#));
        assert!(!head.contains("style.css"));
    }

    #[test]
    fn body_script() {
        let paths = paths(&[]);

        let body = paths.body(None);

        assert!(body.contains("import init from '/app.js';"));
        assert!(body.contains("await init({ module_or_path: '/app_bg.wasm' });"));
        assert!(!body.contains("/__tally/build"));
    }

    #[test]
    fn autoreload_knows_its_generation() {
        let body = paths(&[]).body(Some(7));

        assert!(body.contains("const TALLY_BUILD = '7';"));
        assert!(body.contains("const TALLY_ENDPOINT = '/__tally/build';"));
        assert!(body.contains("generation !== TALLY_BUILD"));
    }

    #[test]
    fn rewrites_head_and_body() {
        let html = rewrite_index(INDEX, "<link head>", "<script body></script>").unwrap();

        assert_eq!(
            html,
            "<!DOCTYPE html>\n<html><head><title>t</title><link head></head>\
             <body><div id=\"app\"></div><script body></script></body></html>"
        );
    }

    #[test]
    fn missing_tags() {
        let err = rewrite_index("<html><body></body></html>", "", "").unwrap_err();
        assert_eq!(err.to_string(), "<head> tag not found");

        let err = rewrite_index("<html><head></head></html>", "", "").unwrap_err();
        assert_eq!(err.to_string(), "<body> tag not found");
    }

    #[test]
    fn template_index_has_mount_point() {
        let html = rewrite_index(include_str!("../init/index.html"), "", "").unwrap();

        assert!(html.contains(r#"<div id="app"></div>"#));
    }
}
