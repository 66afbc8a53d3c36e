//! Domain qualification of canonical DIDs.
//!
//! A canonical DID `did:<method>:<network>:<suffix>` is published to the
//! network named in its third segment. The deployment serving it is reached
//! through `did:<method>:<domain>:<suffix>` instead.

/// Rewrites canonical DIDs and the key references derived from them.
#[derive(Debug, Clone, Copy)]
pub struct DomainRewrite<'a> {
    canonical_prefix: &'a str,
    domain: &'a str,
}

impl<'a> DomainRewrite<'a> {
    pub fn new(canonical_prefix: &'a str, domain: &'a str) -> Self {
        Self {
            canonical_prefix,
            domain,
        }
    }

    /// Domain qualified form of `did`, if it is a canonical DID.
    pub fn rewrite(&self, did: &str) -> Option<String> {
        if !did.starts_with(self.canonical_prefix) {
            return None;
        }

        let segments: Vec<&str> = did.split(':').collect();
        match segments.as_slice() {
            [scheme, method, _network, suffix] => {
                Some(format!("{scheme}:{method}:{}:{suffix}", self.domain))
            }
            _ => None,
        }
    }

    /// Rewrites `did` and replaces every occurrence of it inside `key_ref`.
    ///
    /// Non canonical DIDs are returned unchanged along with `key_ref`.
    pub fn apply(&self, did: &str, key_ref: Option<&str>) -> (String, Option<String>) {
        match self.rewrite(did) {
            Some(qualified) => {
                let key_ref = key_ref.map(|key_ref| key_ref.replace(did, &qualified));
                (qualified, key_ref)
            }
            None => (did.to_owned(), key_ref.map(str::to_owned)),
        }
    }
}
