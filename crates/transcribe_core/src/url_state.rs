use url::form_urlencoded;

pub const PARAM_CATEGORY: &str = "cat";
pub const PARAM_JOB: &str = "job";
pub const PARAM_SHARED: &str = "shared";
pub const PARAM_SHARED_BY: &str = "by";

/// The query parameters of the navigable address that the session reads and
/// writes. Unknown parameters are not preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlState {
    pub cat: Option<String>,
    pub job: Option<String>,
    pub shared: Option<String>,
    pub by: Option<String>,
}

impl UrlState {
    /// Parses a query string, with or without the leading `?`. Empty values
    /// count as absent.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                PARAM_CATEGORY => &mut state.cat,
                PARAM_JOB => &mut state.job,
                PARAM_SHARED => &mut state.shared,
                PARAM_SHARED_BY => &mut state.by,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        state
    }

    /// Extracts the state from a full URL. Unparseable input yields the empty state.
    pub fn from_url(raw: &str) -> Self {
        match url::Url::parse(raw) {
            Ok(parsed) => Self::from_query(parsed.query().unwrap_or_default()),
            Err(_) => Self::default(),
        }
    }

    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let pairs = [
            (PARAM_CATEGORY, &self.cat),
            (PARAM_JOB, &self.job),
            (PARAM_SHARED, &self.shared),
            (PARAM_SHARED_BY, &self.by),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    pub fn with_category(mut self, cat: Option<&str>) -> Self {
        self.cat = cat.filter(|v| !v.is_empty()).map(str::to_string);
        self
    }

    pub fn with_job(mut self, job: Option<&str>) -> Self {
        self.job = job.filter(|v| !v.is_empty()).map(str::to_string);
        self
    }

    /// `None` when the parameter is absent; otherwise whether it is truthy.
    pub fn shared_mode(&self) -> Option<bool> {
        self.shared.as_deref().map(|raw| {
            matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_params_and_ignores_the_rest() {
        let state = UrlState::from_query("?cat=cat_1&job=abc123&utm=x&shared=Yes&by=a%40b.com");
        assert_eq!(state.cat.as_deref(), Some("cat_1"));
        assert_eq!(state.job.as_deref(), Some("abc123"));
        assert_eq!(state.shared_mode(), Some(true));
        assert_eq!(state.by.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn empty_values_are_absent() {
        let state = UrlState::from_query("cat=&job=");
        assert_eq!(state, UrlState::default());
        assert_eq!(state.to_query(), "");
    }

    #[test]
    fn serializes_in_stable_order() {
        let state = UrlState::default()
            .with_job(Some("abc123"))
            .with_category(Some("all"));
        assert_eq!(state.to_query(), "cat=all&job=abc123");
        assert_eq!(UrlState::from_query(&state.to_query()), state);
    }

    #[test]
    fn from_url_reads_query() {
        let state = UrlState::from_url("http://localhost:5173/?job=j1");
        assert_eq!(state.job.as_deref(), Some("j1"));
        assert_eq!(UrlState::from_url("not a url"), UrlState::default());
    }

    #[test]
    fn falsy_shared_flag() {
        assert_eq!(UrlState::from_query("shared=0").shared_mode(), Some(false));
        assert_eq!(UrlState::from_query("").shared_mode(), None);
    }
}
