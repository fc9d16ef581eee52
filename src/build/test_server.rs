//! Loopback HTTP/1.1 server for fetcher and source tests

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub struct Reply {
	pub status: u16,
	pub content_type: Option<&'static str>,
	pub body: Vec<u8>,
	/// Send `Content-Length`; without it the body runs until the socket closes
	pub with_length: bool,
}

impl Reply {
	pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
		Self { status: 200, content_type: Some(content_type), body: body.into(), with_length: true }
	}

	pub fn status(status: u16) -> Self {
		Self { status, content_type: Some("text/plain"), body: b"nope".to_vec(), with_length: true }
	}
}

pub struct TestServer {
	pub base: String,
	requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
	/// Serve every request with `handler(path_and_query)` until the test exits
	pub fn start<F>(handler: F) -> Self
	where
		F: Fn(&str) -> Reply + Send + 'static,
	{
		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let base = format!("http://{}", listener.local_addr().unwrap());
		let requests = Arc::new(Mutex::new(Vec::new()));
		let seen = Arc::clone(&requests);

		thread::spawn(move || {
			for stream in listener.incoming() {
				let Ok(mut stream) = stream else { continue };
				let mut reader = BufReader::new(stream.try_clone().unwrap());

				let mut request_line = String::new();
				if reader.read_line(&mut request_line).is_err() {
					continue;
				}
				loop {
					let mut header = String::new();
					match reader.read_line(&mut header) {
						Ok(0) | Err(_) => break,
						Ok(_) if header == "\r\n" => break,
						Ok(_) => {}
					}
				}

				let target = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
				seen.lock().unwrap().push(target.clone());
				let reply = handler(&target);

				let mut head = format!("HTTP/1.1 {} Test\r\nConnection: close\r\n", reply.status);
				if let Some(kind) = reply.content_type {
					head.push_str(&format!("Content-Type: {}\r\n", kind));
				}
				if reply.with_length {
					head.push_str(&format!("Content-Length: {}\r\n", reply.body.len()));
				}
				head.push_str("\r\n");
				let _ = stream.write_all(head.as_bytes());
				let _ = stream.write_all(&reply.body);
				let _ = stream.flush();
			}
		});

		Self { base, requests }
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{}", self.base, path)
	}

	pub fn requests(&self) -> Vec<String> {
		self.requests.lock().unwrap().clone()
	}
}
