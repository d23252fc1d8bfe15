//! Path templates with single-segment captures.
//!
//! `/users/{id}/profile` compiles to three segments: the literal `users`, a
//! capture named `id`, and the literal `profile`. A path matches when it has
//! the same number of `/`-separated segments, every literal segment is equal
//! byte for byte, and every capture segment is non-empty. There is no
//! wildcard and no backtracking; characters outside `{…}` carry no special
//! meaning.

use crate::request::Params;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A compiled path template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathMatcher {
    template: String,
    segments: Vec<Segment>,
}

impl PathMatcher {
    /// Compiles `template`. Only a whole segment of the form `{name}` is a
    /// capture; `v{id}` is an ordinary literal.
    pub fn new(template: &str) -> Self {
        let segments = template
            .split('/')
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                    Segment::Capture(name.to_owned())
                }
                _ => Segment::Literal(seg.to_owned()),
            })
            .collect();
        Self { template: template.to_owned(), segments }
    }

    pub fn template(&self) -> &str { &self.template }

    /// Capture names in template order, duplicates included.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/');
        let all_match = self.segments.iter().all(|seg| match (seg, parts.next()) {
            (Segment::Literal(lit), Some(part)) => lit == part,
            (Segment::Capture(_), Some(part)) => !part.is_empty(),
            (_, None) => false,
        });
        all_match && parts.next().is_none()
    }

    /// Capture name → matched segment, in template order. Empty when `path`
    /// does not match.
    ///
    /// A name captured twice keeps the value of its last occurrence.
    pub fn extract_params(&self, path: &str) -> Params {
        if !self.matches(path) {
            return Params::new();
        }
        self.segments
            .iter()
            .zip(path.split('/'))
            .filter_map(|(seg, part)| match seg {
                Segment::Capture(name) => Some((name.clone(), part.to_owned())),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_capture_segments() {
        let m = PathMatcher::new("/users/{id}/profile");
        assert!(m.matches("/users/42/profile"));
        assert!(!m.matches("/users/42"));
        assert!(!m.matches("/users//profile"));
        assert!(!m.matches("/users/42/settings"));
        assert!(!m.matches("/users/42/profile/"));
    }

    #[test]
    fn root_matches_only_root() {
        let m = PathMatcher::new("/");
        assert!(m.matches("/"));
        assert!(!m.matches(""));
        assert!(!m.matches("/x"));
    }

    #[test]
    fn regex_metacharacters_are_plain_text() {
        let m = PathMatcher::new("/files/a.b+(c)/{name}");
        assert!(m.matches("/files/a.b+(c)/x"));
        assert!(!m.matches("/files/aXb+(c)/x"));
    }

    #[test]
    fn partial_brace_segments_are_literal() {
        let m = PathMatcher::new("/v{n}");
        assert!(m.matches("/v{n}"));
        assert!(!m.matches("/v2"));
        assert_eq!(m.capture_names().count(), 0);
    }

    #[test]
    fn equal_segment_counts_match_iff_literals_agree() {
        let template = ["", "api", "{a}", "items", "{b}"];
        let m = PathMatcher::new(&template.join("/"));
        let candidates = [
            ["", "api", "x", "items", "y"],
            ["", "api", "x", "things", "y"],
            ["", "API", "x", "items", "y"],
            ["", "api", "1", "items", "2"],
        ];
        for path in candidates {
            let literals_agree = template
                .iter()
                .zip(path)
                .all(|(t, p)| t.starts_with('{') || *t == p);
            assert_eq!(m.matches(&path.join("/")), literals_agree, "{path:?}");
        }
    }

    #[test]
    fn extraction_inverts_substitution() {
        let m = PathMatcher::new("/orgs/{org}/repos/{repo}/issues/{n}");
        for values in [["acme", "trellis", "1"], ["a b", "x.y", "%20"], ["-", "_", "∞"]] {
            let path = format!("/orgs/{}/repos/{}/issues/{}", values[0], values[1], values[2]);
            let params = m.extract_params(&path);
            let got: Vec<_> = params.values().map(String::as_str).collect();
            assert_eq!(got, values);
            assert_eq!(params.keys().collect::<Vec<_>>(), ["org", "repo", "n"]);
        }
    }

    #[test]
    fn duplicate_capture_names_keep_last_value() {
        let m = PathMatcher::new("/org/{id}/user/{id}");
        let params = m.extract_params("/org/7/user/99");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id").map(String::as_str), Some("99"));
    }

    #[test]
    fn no_match_extracts_nothing() {
        assert!(PathMatcher::new("/a/{x}").extract_params("/b/1").is_empty());
    }
}
