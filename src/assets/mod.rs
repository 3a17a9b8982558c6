//! Page asset provider - serves the client HTML to plain GET requests
//!
//! The page content is opaque to the core: it is read from an override path,
//! a file beside the working directory, or an embedded placeholder.

use std::fs;

const FALLBACK_PAGE: &str =
    "<!DOCTYPE html><html><body><h1>arena.html not found next to server</h1></body></html>";

/// Filename variants tried in order when no override path is configured.
const PAGE_CANDIDATES: [&str; 2] = ["arena.html", "game.html"];

/// Load the game page bytes.
pub fn load_page(override_path: Option<&str>) -> Vec<u8> {
    if let Some(path) = override_path {
        if let Ok(bytes) = fs::read(path) {
            return bytes;
        }
    }
    for name in PAGE_CANDIDATES {
        if let Ok(bytes) = fs::read(name) {
            return bytes;
        }
    }
    FALLBACK_PAGE.as_bytes().to_vec()
}

/// Build the full HTTP 200 response for a non-upgrade GET.
pub fn page_response(override_path: Option<&str>) -> Vec<u8> {
    let body = load_page(override_path);
    let mut response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(&body);
    response
}
