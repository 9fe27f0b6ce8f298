use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::Ipv4Addr;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tokio::sync::watch;
use tokio::task::{self, LocalSet};
use tower_async::Service;
use tower_async_http::compression::Compression;
use tower_async_http::services::ServeDir;

use crate::build::build;
use crate::config::Config;
use crate::log;
use crate::report::{ErrorExt, Report};
use crate::Serve;

/// Polled by the autoreload script, responds with the generation of the latest build.
pub const BUILD_ENDPOINT: &str = "/__tally/build";

/// Paths that trigger a rebuild when changed.
const WATCHED: [&str; 3] = ["src", "index.html", "Cargo.toml"];

const DEBOUNCE: Duration = Duration::from_millis(200);

type BoxError = Box<dyn StdError + Send + Sync>;
type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;
type Files = Compression<ServeDir>;

pub fn serve(s: &Serve) -> Report<()> {
    let config = Config::load(&s.build)?;

    build(&config, 0)?;

    let (generation, rx) = watch::channel(0_u64);

    // Dropping the watcher stops it, so it has to outlive the server
    let _watcher = if s.no_watch {
        None
    } else {
        Some(watch_sources(config.clone(), generation)?)
    };

    let files = files(&config.dist);

    Builder::new_current_thread()
        .enable_all()
        .build()
        .message("failed to create tokio runtime")?
        .block_on(LocalSet::new().run_until(listen(s.port, files, rx)))
}

fn files(dist: &Path) -> Files {
    Compression::new(ServeDir::new(dist))
}

fn watch_sources(config: Config, generation: watch::Sender<u64>) -> Report<RecommendedWatcher> {
    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(tx)
        .map_err_into_io()
        .message("failed to create file watcher")?;

    for path in WATCHED.map(Path::new).into_iter().filter(|p| p.exists()) {
        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err_into_io()
            .with_message(|| format!("failed to watch {}", path.display()))?;

        log::watching!("{}", path.display());
    }

    thread::spawn(move || {
        while let Ok(event) = rx.recv() {
            if !is_change(&event) {
                continue;
            }

            // Editors tend to write files in bursts
            thread::sleep(DEBOUNCE);
            rx.try_iter().for_each(drop);

            rebuild(&generation, |next| build(&config, next));
        }
    });

    Ok(watcher)
}

/// Run a build for the next generation and publish it once it succeeded.
/// Failures are logged, the previous build keeps being served.
fn rebuild<F>(generation: &watch::Sender<u64>, build: F)
where
    F: FnOnce(u64) -> Report<()>,
{
    let next = *generation.borrow() + 1;

    match build(next) {
        Ok(()) => {
            generation.send_replace(next);
        }
        Err(err) => log::error!("{err}"),
    }
}

fn is_change(event: &notify::Result<notify::Event>) -> bool {
    match event {
        Ok(event) => matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ),
        Err(err) => {
            log::error!("file watcher: {err}");
            false
        }
    }
}

async fn listen(port: u16, files: Files, generation: watch::Receiver<u64>) -> Report<()> {
    let ip = Ipv4Addr::LOCALHOST;

    let listener = TcpListener::bind((ip, port))
        .await
        .with_message(|| format!("failed to bind tcp listener to {ip}:{port}"))?;

    log::starting!("development server at http://{ip}:{port}");

    let files = Rc::new(files);

    loop {
        let (tcp, _) = listener
            .accept()
            .await
            .message("failed to accept tcp connection")?;

        let files = files.clone();
        let generation = generation.clone();

        task::spawn_local(async move {
            let io = TokioIo::new(tcp);
            let service = service_fn(move |req| {
                let files = files.clone();
                let generation = generation.clone();

                async move { respond(req, &*files, &generation).await }
            });

            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, service)
                .await
            {
                log::error!("serving connection: {err}");
            }
        });
    }
}

async fn respond<B, S, R>(
    req: Request<B>,
    files: &S,
    generation: &watch::Receiver<u64>,
) -> Result<Response<ResponseBody>, Infallible>
where
    S: Service<Request<B>, Response = Response<R>, Error = Infallible>,
    R: Body<Data = Bytes> + Send + 'static,
    R::Error: Into<BoxError>,
{
    let mut res: Response<ResponseBody> = if req.uri().path() == BUILD_ENDPOINT {
        let body = Full::new(Bytes::from(generation.borrow().to_string()))
            .map_err(|never| match never {})
            .boxed_unsync();

        let mut res = Response::new(body);
        res.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    } else {
        files
            .call(req)
            .await?
            .map(|body| body.map_err(Into::into).boxed_unsync())
    };

    res.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(res)
}
