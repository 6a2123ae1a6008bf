use crate::UrlError;
use url::Url;

/// Query parameters that never change which event a link points at
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "ref_src", "source"];

/// Canonicalizes an event link into the form used as its identity
///
/// Two links that point at the same event page must canonicalize to the same
/// URL, so this:
///
/// 1. Accepts only `http` and `https`, and rewrites `http` to `https`
/// 2. Lowercases the host and strips a leading `www.`
/// 3. Collapses empty and `.` path segments, resolves `..`
/// 4. Drops the trailing slash (the root path stays `/`)
/// 5. Drops the fragment
/// 6. Drops tracking query parameters (`utm_*`, `fbclid`, ...) and sorts the rest
///
/// # Examples
///
/// ```
/// use event_sweep::url::canonicalize;
///
/// let url = canonicalize("http://WWW.District.in/events/gig/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://district.in/events/gig");
/// ```
pub fn canonicalize(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "https" => {}
        "http" => url
            .set_scheme("https")
            .map_err(|_| UrlError::Malformed(format!("cannot switch {} to https", raw)))?,
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("invalid host {}: {}", host, e)))?;

    let path = collapse_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

fn collapse_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
