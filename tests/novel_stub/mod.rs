use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Fake novel site plus a fake `translate_a/single` endpoint.
///
/// Pages:
/// - `/novel/chapter-1/` → next `/novel/chapter-2/`
/// - `/novel/chapter-2/` → next `/novel/premium/chapter-3/`
/// - `/solo/` title `Ch1`, content `Hello World`, no next link
/// - `/empty/` only short paragraphs, next `/novel/chapter-2/`
/// - `/headless/` no heading, no next link
///
/// Every page hit also records the request's `User-Agent`.
///
/// Translation prefixes every text with `[id] `; `/broken/translate_a/single`
/// always answers 500.
pub struct NovelStub {
    pub base_url: String,
    page_hits: Arc<Mutex<Vec<String>>>,
    page_user_agents: Arc<Mutex<Vec<String>>>,
    translate_inputs: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl NovelStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start novel stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let page_hits = Arc::new(Mutex::new(Vec::new()));
        let page_user_agents = Arc::new(Mutex::new(Vec::new()));
        let translate_inputs = Arc::new(Mutex::new(Vec::new()));

        let thread_base = base_url.clone();
        let thread_hits = Arc::clone(&page_hits);
        let thread_user_agents = Arc::clone(&page_user_agents);
        let thread_inputs = Arc::clone(&translate_inputs);
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url).to_owned();

                if path.ends_with("/translate_a/single") {
                    let mut body = String::new();
                    if request.as_reader().read_to_string(&mut body).is_err() {
                        let _ = request.respond(
                            tiny_http::Response::from_string("invalid body").with_status_code(400),
                        );
                        continue;
                    }
                    let q = url::form_urlencoded::parse(body.as_bytes())
                        .find(|(key, _)| key == "q")
                        .map(|(_, value)| value.into_owned())
                        .unwrap_or_default();
                    thread_inputs.lock().expect("lock inputs").push(q.clone());

                    if path.starts_with("/broken/") {
                        let _ = request.respond(
                            tiny_http::Response::from_string("quota exceeded")
                                .with_status_code(500),
                        );
                        continue;
                    }

                    let body =
                        serde_json::json!([[[format!("[id] {q}"), q, null, null, 1]], null, "en"]);
                    let header = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"application/json"[..],
                    )
                    .expect("build header");
                    let _ = request.respond(
                        tiny_http::Response::from_string(body.to_string()).with_header(header),
                    );
                    continue;
                }

                thread_hits.lock().expect("lock hits").push(path.clone());
                let user_agent = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("User-Agent"))
                    .map(|header| header.value.as_str().to_owned())
                    .unwrap_or_default();
                thread_user_agents.lock().expect("lock user agents").push(user_agent);
                let page = match path.as_str() {
                    "/novel/chapter-1/" => Some(chapter_page(
                        "Ch1",
                        &["It was a quiet morning.", "Nobody expected the king."],
                        Some(&format!("{thread_base}/novel/chapter-2/")),
                    )),
                    "/novel/chapter-2/" => Some(chapter_page(
                        "Ch2",
                        &["The second day began."],
                        Some(&format!("{thread_base}/novel/premium/chapter-3/")),
                    )),
                    "/novel/premium/chapter-3/" => {
                        Some(chapter_page("Ch3", &["Locked content."], None))
                    }
                    "/solo/" => Some(chapter_page("Ch1", &["Hello World"], None)),
                    "/empty/" => Some(format!(
                        r#"<!doctype html><html><body><h1>Empty</h1><p>short</p>
<a href="{thread_base}/novel/chapter-2/">Next</a></body></html>"#
                    )),
                    "/headless/" => Some(
                        r#"<!doctype html><html><body>
<div class="entry-content"><p>Nameless body text.</p></div>
</body></html>"#
                            .to_owned(),
                    ),
                    _ => None,
                };

                let response = match page {
                    Some(html) => {
                        let header = tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/html; charset=utf-8"[..],
                        )
                        .expect("build header");
                        tiny_http::Response::from_string(html).with_header(header)
                    }
                    None => tiny_http::Response::from_string("not found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            page_hits,
            page_user_agents,
            translate_inputs,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn page_hits(&self) -> Vec<String> {
        self.page_hits.lock().expect("lock hits").clone()
    }

    pub fn page_user_agents(&self) -> Vec<String> {
        self.page_user_agents.lock().expect("lock user agents").clone()
    }

    pub fn translate_inputs(&self) -> Vec<String> {
        self.translate_inputs.lock().expect("lock inputs").clone()
    }
}

impl Drop for NovelStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn chapter_page(title: &str, paragraphs: &[&str], next: Option<&str>) -> String {
    let body = paragraphs
        .iter()
        .map(|p| format!("<p>{p}</p>"))
        .collect::<Vec<_>>()
        .join("\n");
    let next_link = match next {
        Some(href) => format!(r#"<a class="btn" href="{href}">Next &raquo;</a>"#),
        None => String::new(),
    };
    format!(
        r#"<!doctype html>
<html>
  <head><title>{title} | Novel</title><script>var ads = [];</script></head>
  <body>
    <h1>{title}</h1>
    <div class="text-left"><p>Reading settings</p></div>
    <div class="text-left">
      {body}
      <div class="code-block code-block-2"><p>Advertisement</p></div>
    </div>
    <a href="/novel/">Index</a>
    {next_link}
  </body>
</html>
"#
    )
}
