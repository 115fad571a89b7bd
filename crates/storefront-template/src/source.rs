//! Static and per-request template sources.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TemplateError;
use crate::template::HtmlTemplate;

/// Computes the template for a request URL.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    /// Template HTML for `url` (the full request URL).
    async fn template(&self, url: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl<F, Fut> TemplateProvider for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn template(&self, url: &str) -> anyhow::Result<String> {
        (self)(url.to_string()).await
    }
}

/// Where the HTML template comes from.
#[derive(Clone)]
pub enum TemplateSource {
    /// One template for every request, parsed once.
    Static(Arc<HtmlTemplate>),
    /// A template computed per request.
    Provider(Arc<dyn TemplateProvider>),
}

impl TemplateSource {
    /// Static template from HTML.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self::Static(Arc::new(HtmlTemplate::parse(html)))
    }

    /// Static template read from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_html(html))
    }

    /// Per-request template provider.
    pub fn provider(provider: impl TemplateProvider + 'static) -> Self {
        Self::Provider(Arc::new(provider))
    }

    /// Template for this request. Provider errors are returned unchanged.
    pub async fn resolve(&self, url: &str) -> Result<Arc<HtmlTemplate>, TemplateError> {
        match self {
            Self::Static(template) => Ok(Arc::clone(template)),
            Self::Provider(provider) => {
                let html = provider
                    .template(url)
                    .await
                    .map_err(TemplateError::Provider)?;
                Ok(Arc::new(HtmlTemplate::parse(html)))
            }
        }
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(template) => f
                .debug_tuple("Static")
                .field(&template.slots())
                .finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_static_source_is_shared() {
        let source = TemplateSource::from_html("<html><head></head></html>");

        let a = source.resolve("https://shop.example/a").await.unwrap();
        let b = source.resolve("https://shop.example/b").await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_provider_receives_url() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = TemplateSource::provider(move |url: String| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(format!("<html><body data-url=\"{}\"></body></html>", url))
            }
        });

        let template = source.resolve("https://shop.example/p?x=1").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(template
            .as_str()
            .contains("data-url=\"https://shop.example/p?x=1\""));
    }

    #[tokio::test]
    async fn test_provider_error_is_unchanged() {
        let source = TemplateSource::provider(|_url: String| async {
            Err::<String, _>(anyhow::anyhow!("client build not ready"))
        });

        let err = source.resolve("https://shop.example/").await.unwrap_err();

        assert!(matches!(err, TemplateError::Provider(_)));
        assert_eq!(err.to_string(), "client build not ready");
    }

    #[test]
    fn test_from_missing_file() {
        let err = TemplateSource::from_file("/no/such/index.html").unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }
}
