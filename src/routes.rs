//! Entry points into the flow and the post-submission redirect
use url::{Url, form_urlencoded};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Scan,
    /// `/code`, `/code/:code` or `/code?code=..`
    Code(Option<String>),
    Success {
        report_id: Option<String>,
        code: Option<String>,
    },
    NotFound,
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve a path (`/code/IFL-ABC123`) or absolute URL to a route.
/// Legacy `/report` and `/scan-qr` paths map onto their replacements.
pub fn parse_route(input: &str) -> Route {
    let Ok(base) = Url::parse("http://localhost/") else {
        return Route::NotFound;
    };
    let Ok(url) = base.join(input.trim()) else {
        return Route::NotFound;
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [] => Route::Home,
        ["scan"] | ["scan-qr"] => Route::Scan,
        ["code"] | ["report"] => Route::Code(query_param(&url, "code")),
        ["code", code] => Route::Code(Some(code.to_string())),
        ["success"] => Route::Success {
            report_id: query_param(&url, "reportId"),
            code: query_param(&url, "code"),
        },
        _ => Route::NotFound,
    }
}

/// `/success?reportId=<id>&code=<code>`
pub fn success_redirect(report_id: &str, code: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("reportId", report_id)
        .append_pair("code", code)
        .finish();
    format!("/success?{query}")
}
