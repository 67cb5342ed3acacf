/// Immutable-after-setup client configuration: environment tag, base tag
/// set, metric-name prefix, and host label.
#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    base_tags: Vec<String>,
    prefix: String,
    host: String,
}

impl ClientConfig {
    /// Builds the base tag set and normalized prefix.
    ///
    /// Base tags are the caller's tags in their given order, then the
    /// environment tag, then the build tag if a build identifier was
    /// supplied. Caller duplicates are kept verbatim.
    pub(crate) fn new(
        environment: &str,
        caller_tags: Vec<String>,
        prefix: String,
        host: String,
        build_id: Option<&str>,
    ) -> Self {
        let mut base_tags = caller_tags;
        base_tags.push(format!("env:{environment}"));
        if let Some(build_id) = build_id {
            base_tags.push(format!("build:{build_id}"));
        }

        ClientConfig { base_tags, prefix: normalize_prefix(&prefix), host }
    }

    pub(crate) fn base_tags(&self) -> &[String] {
        &self.base_tags
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    /// Appends each tag not already present, preserving first-seen order.
    pub(crate) fn add_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.base_tags.contains(&tag) {
                self.base_tags.push(tag);
            }
        }
    }

    /// Nests a further namespace segment under the current prefix.
    pub(crate) fn add_prefix(&mut self, segment: &str) {
        let segment = normalize_prefix(segment);
        if self.prefix.is_empty() {
            self.prefix = segment;
        } else {
            self.prefix.push('.');
            self.prefix.push_str(&segment);
        }
    }

    /// Joins the prefix onto a bare metric name with a single delimiter.
    pub(crate) fn full_name(&self, metric: &str) -> String {
        if self.prefix.is_empty() {
            metric.to_owned()
        } else {
            format!("{}.{metric}", self.prefix)
        }
    }

    /// Call-site tags first, then the base tags. Duplicates permitted.
    pub(crate) fn effective_tags(&self, call_tags: &[&str]) -> Vec<String> {
        let mut tags = Vec::with_capacity(call_tags.len() + self.base_tags.len());
        tags.extend(call_tags.iter().map(|tag| (*tag).to_owned()));
        tags.extend(self.base_tags.iter().cloned());
        tags
    }
}

/// Strips trailing delimiters so that joining never produces `".."`.
fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('.').to_owned()
}
