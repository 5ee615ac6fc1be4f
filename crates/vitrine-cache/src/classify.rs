#![forbid(unsafe_code)]

use vitrine_net::{Method, Request};

use crate::manifest::CacheManifest;

/// How the controller treats an intercepted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestClass {
    /// Not intercepted; the host handles it normally.
    Bypass,
    /// Versioned assets and allow-listed fonts: cache-first.
    Static,
    /// Same-origin everything else: network-first.
    Dynamic,
}

pub fn classify(request: &Request, manifest: &CacheManifest) -> RequestClass {
    if request.method != Method::Get {
        return RequestClass::Bypass;
    }

    let url = &request.url;
    let font_origin = url
        .host_str()
        .is_some_and(|host| manifest.font_origins.iter().any(|f| f.eq_ignore_ascii_case(host)));
    if font_origin {
        return RequestClass::Static;
    }
    if url.origin() != manifest.origin.origin() {
        return RequestClass::Bypass;
    }

    let extension = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension {
        Some(ext) if manifest.static_extensions.iter().any(|s| *s == ext) => RequestClass::Static,
        _ => RequestClass::Dynamic,
    }
}
