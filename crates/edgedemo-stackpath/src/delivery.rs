//! CDN delivery sites and certificates

use crate::client::{ResultsPage, StackPathClient};
use crate::error::Result;
use crate::stack::Stack;
use serde::{Deserialize, Serialize};

/// Suffix of the edge hostname a site is reachable at
pub const DELIVERY_DOMAIN_SUFFIX: &str = ".stackpathcdn.com";

/// A CDN site with its WAF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SiteEnvelope {
    site: Site,
}

#[derive(Debug, Deserialize)]
struct DeliveryDomain {
    domain: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSiteRequest<'a> {
    domain: &'a str,
    origin: Origin<'a>,
    features: [&'a str; 2],
    configuration: SiteConfiguration<'a>,
}

#[derive(Debug, Serialize)]
struct Origin<'a> {
    path: &'a str,
    hostname: &'a str,
    port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteConfiguration<'a> {
    origin_pull_protocol: OriginPullProtocol<'a>,
}

#[derive(Debug, Serialize)]
struct OriginPullProtocol<'a> {
    protocol: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CertificateRequest<'a> {
    verification_method: &'a str,
}

impl<'a> CreateSiteRequest<'a> {
    fn new(domain: &'a str, origin_ip: &'a str) -> Self {
        Self {
            domain,
            origin: Origin {
                path: "/",
                hostname: origin_ip,
                port: 80,
            },
            features: ["CDN", "WAF"],
            configuration: SiteConfiguration {
                origin_pull_protocol: OriginPullProtocol { protocol: "http" },
            },
        }
    }
}

/// Pick the `stackpathcdn.com` hostname out of a site's delivery domains
fn select_delivery_domain(domains: Vec<DeliveryDomain>) -> Option<String> {
    domains
        .into_iter()
        .map(|d| d.domain)
        .find(|domain| domain.ends_with(DELIVERY_DOMAIN_SUFFIX))
}

impl StackPathClient {
    /// Put CDN and WAF in front of `origin_ip`, serving `domain`
    ///
    /// See: https://stackpath.dev/reference/sites#createsite-1
    pub async fn create_site(&self, stack: &Stack, origin_ip: &str, domain: &str) -> Result<Site> {
        tracing::info!("Creating delivery site {} -> {}", domain, origin_ip);
        let envelope: SiteEnvelope = self
            .post_json(
                &format!("/delivery/v1/stacks/{}/sites", stack.slug),
                &CreateSiteRequest::new(domain, origin_ip),
            )
            .await?;

        Ok(envelope.site)
    }

    /// Fetch an existing site by ID
    ///
    /// See: https://stackpath.dev/reference/sites#getsite-1
    pub async fn get_site(&self, stack: &Stack, site_id: &str) -> Result<Site> {
        let envelope: SiteEnvelope = self
            .get_json(
                &format!("/delivery/v1/stacks/{}/sites/{}", stack.slug, site_id),
                &[],
            )
            .await?;

        Ok(envelope.site)
    }

    /// The site's edge hostname, usable as a CNAME target. `None` when the
    /// site has no `stackpathcdn.com` delivery domain yet.
    ///
    /// See: https://stackpath.dev/reference/delivery-domains#getsitedeliverydomains2
    pub async fn find_delivery_domain(&self, stack: &Stack, site: &Site) -> Result<Option<String>> {
        let page: ResultsPage<DeliveryDomain> = self
            .get_json(
                &format!(
                    "/delivery/v1/stacks/{}/sites/{}/delivery_domains",
                    stack.slug, site.id
                ),
                &[],
            )
            .await?;

        Ok(select_delivery_domain(page.results))
    }

    /// Request an auto-renewing certificate, verified over DNS
    ///
    /// See: https://stackpath.dev/reference/ssl-1#requestcertificate
    pub async fn request_certificate(&self, stack: &Stack, site: &Site) -> Result<()> {
        self.post(
            &format!(
                "/cdn/v1/stacks/{}/sites/{}/certificates/request",
                stack.slug, site.id
            ),
            &CertificateRequest {
                verification_method: "DNS",
            },
        )
        .await?;

        Ok(())
    }
}
