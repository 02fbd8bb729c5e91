use url::Url;

/// Last non-empty path segment of `url_str`, or a random `download_<uuid>` name.
pub fn get_filename_from_url(url_str: &str) -> String {
    if let Ok(url) = Url::parse(url_str) {
        if let Some(segments) = url.path_segments() {
            if let Some(filename) = segments.filter(|s| !s.is_empty()).last() {
                return filename.to_string();
            }
        }
    }

    format!("download_{}", uuid::Uuid::new_v4())
}

pub fn sanitize_filename(filename: &str) -> String {
    filename.replace(|c: char| !c.is_alphanumeric() && c != '.' && c != '-' && c != '_', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url_path() {
        assert_eq!(get_filename_from_url("https://example.com/img/house.png"), "house.png");
        assert_eq!(get_filename_from_url("https://example.com/img/house.png?x=1"), "house.png");
        assert_eq!(get_filename_from_url("https://example.com/img/"), "img");
    }

    #[test]
    fn test_filename_fallback() {
        assert!(get_filename_from_url("https://example.com/").starts_with("download_"));
        assert!(get_filename_from_url("not a url").starts_with("download_"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a b?c.png"), "a_b_c.png");
        assert_eq!(sanitize_filename("../etc"), ".._etc");
    }
}
