//! HTTP-backed portal session
//!
//! Implements [`SessionDriver`] over reqwest + scraper for the legacy
//! ASP.NET-style portal: a cookie jar carries the authenticated session,
//! `type_text` accumulates form values, and `click` on a submit control
//! replays the view's hidden fields (view state and friends) together with
//! the accumulated values as a form post. No JavaScript runs; every view is
//! whatever the server renders.
//!
//! HTML documents are parsed only inside synchronous helpers and never held
//! across an await point.

use crate::config::PortalConfig;
use crate::session::driver::{
    Credentials, SessionDriver, SessionError, SessionResult, WaitOutcome,
};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Selector for the login form's username field
pub const USERNAME_FIELD: &str = "input[name='ctl00$body$txtUsername']";
/// Selector for the login form's password field
pub const PASSWORD_FIELD: &str = "input[name='ctl00$body$txtPassword']";

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A stateful HTTP session against the portal
pub struct PortalSession {
    client: Client,
    base: Url,
    current_url: Option<Url>,
    body: Option<String>,
    /// Form values typed since the last navigation, keyed by field name
    pending_fields: Vec<(String, String)>,
}

impl PortalSession {
    /// Builds a session from portal configuration
    ///
    /// The HTTP client keeps cookies (the portal's session token lives
    /// there) and follows redirects, matching post-login behavior.
    pub fn new(config: &PortalConfig) -> SessionResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("flightline/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let base = Url::parse(&config.base_url).map_err(|e| SessionError::Navigation {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            base,
            current_url: None,
            body: None,
            pending_fields: Vec::new(),
        })
    }

    /// Resolves a possibly-relative URL against the portal base
    fn resolve(&self, url: &str) -> SessionResult<Url> {
        self.base.join(url).map_err(|e| SessionError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetches a URL with GET and replaces the current view
    async fn fetch(&mut self, url: Url) -> SessionResult<()> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| SessionError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        self.current_url = Some(final_url);
        self.body = Some(body);
        self.pending_fields.clear();
        Ok(())
    }

    /// Submits the current view's form, carrying hidden fields, accumulated
    /// typed values, and an optional activating control
    async fn submit_form(&mut self, control: Option<(String, String)>) -> SessionResult<()> {
        let body = self.body.as_deref().ok_or(SessionError::NoView)?;
        let current = self.current_url.clone().ok_or(SessionError::NoView)?;

        let mut fields = hidden_fields(body);
        for (name, value) in &self.pending_fields {
            replace_field(&mut fields, name, value);
        }
        if let Some((name, value)) = control {
            replace_field(&mut fields, &name, &value);
        }

        let action = match form_action(body) {
            Some(action) => current
                .join(&action)
                .map_err(|e| SessionError::Navigation {
                    url: action,
                    message: e.to_string(),
                })?,
            None => current.clone(),
        };

        let response = self
            .client
            .post(action.clone())
            .form(&fields)
            .send()
            .await
            .map_err(|e| SessionError::Navigation {
                url: action.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SessionError::Navigation {
                url: action.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let final_url = response.url().clone();
        let text = response.text().await.map_err(|e| SessionError::Navigation {
            url: action.to_string(),
            message: e.to_string(),
        })?;

        self.current_url = Some(final_url);
        self.body = Some(text);
        self.pending_fields.clear();
        Ok(())
    }
}

#[async_trait]
impl SessionDriver for PortalSession {
    async fn open(&mut self, url: &str) -> SessionResult<()> {
        let resolved = self.resolve(url)?;
        self.fetch(resolved).await
    }

    async fn authenticate(&mut self, credentials: &Credentials) -> SessionResult<()> {
        self.type_text(USERNAME_FIELD, &credentials.username).await?;
        self.type_text(PASSWORD_FIELD, &credentials.password).await?;
        self.submit_form(None).await?;

        // A failed login renders the login form again
        let body = self.body.as_deref().ok_or(SessionError::NoView)?;
        if selector_matches(body, USERNAME_FIELD)? {
            return Err(SessionError::AuthRejected);
        }
        Ok(())
    }

    async fn wait_for(&mut self, locator: &str, timeout: Duration) -> SessionResult<WaitOutcome> {
        let deadline = Instant::now() + timeout;
        let mut have_view = false;

        loop {
            if let Some(body) = self.body.as_deref() {
                have_view = true;
                if selector_matches(body, locator)? {
                    return Ok(WaitOutcome::Found);
                }
            }

            if Instant::now() >= deadline {
                // A rendered view without the element is meaningful absence;
                // never having had a view is not
                return Ok(if have_view {
                    WaitOutcome::Absent
                } else {
                    WaitOutcome::TimedOut
                });
            }

            tokio::time::sleep(POLL_INTERVAL).await;

            // Server-rendered portal: the only way content changes is a
            // re-fetch. Fetch failures here are not fatal, the deadline is.
            if let Some(url) = self.current_url.clone() {
                let _ = self.fetch(url).await;
            }
        }
    }

    async fn click(&mut self, locator: &str) -> SessionResult<()> {
        let body = self.body.as_deref().ok_or(SessionError::NoView)?;

        if let Some(href) = element_attr(body, locator, "href")? {
            let resolved = self.resolve(&href)?;
            return self.fetch(resolved).await;
        }

        match element_attr(body, locator, "name")? {
            Some(name) => {
                let value =
                    element_attr(body, locator, "value")?.unwrap_or_default();
                self.submit_form(Some((name, value))).await
            }
            None => {
                if selector_matches(body, locator)? {
                    // Unnamed control: plain form submit
                    self.submit_form(None).await
                } else {
                    Err(SessionError::NotFound {
                        locator: locator.to_string(),
                    })
                }
            }
        }
    }

    async fn type_text(&mut self, locator: &str, text: &str) -> SessionResult<()> {
        let body = self.body.as_deref().ok_or(SessionError::NoView)?;
        let name = element_attr(body, locator, "name")?.ok_or_else(|| SessionError::NotFound {
            locator: locator.to_string(),
        })?;
        replace_field(&mut self.pending_fields, &name, text);
        Ok(())
    }

    async fn read_text(&mut self, locator: &str) -> SessionResult<String> {
        let body = self.body.as_deref().ok_or(SessionError::NoView)?;
        element_text(body, locator)?.ok_or_else(|| SessionError::NotFound {
            locator: locator.to_string(),
        })
    }

    fn view_source(&self) -> SessionResult<String> {
        self.body.clone().ok_or(SessionError::NoView)
    }

    async fn trigger_download(
        &mut self,
        locator: &str,
        dir: &Path,
        expected_name: &str,
        timeout: Duration,
    ) -> SessionResult<PathBuf> {
        let body = self.body.as_deref().ok_or(SessionError::NoView)?;
        let current = self.current_url.clone().ok_or(SessionError::NoView)?;

        let name = element_attr(body, locator, "name")?.ok_or_else(|| SessionError::NotFound {
            locator: locator.to_string(),
        })?;
        let value = element_attr(body, locator, "value")?.unwrap_or_default();

        let mut fields = hidden_fields(body);
        for (field, typed) in &self.pending_fields {
            replace_field(&mut fields, field, typed);
        }
        replace_field(&mut fields, &name, &value);

        let action = match form_action(body) {
            Some(action) => current
                .join(&action)
                .map_err(|e| SessionError::Navigation {
                    url: action,
                    message: e.to_string(),
                })?,
            None => current,
        };

        tokio::fs::create_dir_all(dir).await?;

        let request = self.client.post(action.clone()).form(&fields).send();
        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| SessionError::Timeout {
                locator: locator.to_string(),
                timeout,
            })?
            .map_err(|e| SessionError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SessionError::Download(format!(
                "HTTP {} from {}",
                response.status(),
                action
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SessionError::Download(e.to_string()))?;

        let path = dir.join(expected_name);
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!("Downloaded {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    async fn close(&mut self) -> SessionResult<()> {
        self.current_url = None;
        self.body = None;
        self.pending_fields.clear();
        Ok(())
    }
}

/// Parses a CSS locator
fn parse_selector(locator: &str) -> SessionResult<Selector> {
    Selector::parse(locator).map_err(|e| SessionError::Locator {
        locator: locator.to_string(),
        message: e.to_string(),
    })
}

/// Reports whether a locator matches anything in the document
fn selector_matches(body: &str, locator: &str) -> SessionResult<bool> {
    let selector = parse_selector(locator)?;
    let document = Html::parse_document(body);
    Ok(document.select(&selector).next().is_some())
}

/// Reads an attribute from the first matched element
fn element_attr(body: &str, locator: &str, attr: &str) -> SessionResult<Option<String>> {
    let selector = parse_selector(locator)?;
    let document = Html::parse_document(body);
    Ok(document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string))
}

/// Reads the trimmed text content of the first matched element
fn element_text(body: &str, locator: &str) -> SessionResult<Option<String>> {
    let selector = parse_selector(locator)?;
    let document = Html::parse_document(body);
    Ok(document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string()))
}

/// Collects hidden input fields of the current view's form
///
/// The portal threads its server-side state through these (`__VIEWSTATE`,
/// `__EVENTVALIDATION`); dropping them breaks every post.
fn hidden_fields(body: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(body);
    let selector = match Selector::parse("form input[type='hidden']") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let name = el.value().attr("name")?;
            let value = el.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Reads the action attribute of the view's form, if any
fn form_action(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("form").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("action"))
        .map(str::to_string)
}

/// Sets a form field, replacing any existing entry with the same name
fn replace_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    if let Some(entry) = fields.iter_mut().find(|(n, _)| n == name) {
        entry.1 = value.to_string();
    } else {
        fields.push((name.to_string(), value.to_string()));
    }
}
