//! DNS zones and records

use crate::client::StackPathClient;
use crate::error::Result;
use crate::stack::Stack;
use serde::{Deserialize, Serialize};

const CNAME_TTL: u32 = 60;

/// A DNS zone hosted on StackPath
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    #[serde(rename = "domain")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ZonesPage {
    #[serde(default)]
    zones: Vec<Zone>,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    data: &'a str,
    ttl: u32,
}

impl StackPathClient {
    /// Find the zone for `domain` on a stack. `None` means it does not exist.
    ///
    /// See: https://stackpath.dev/reference/zones#getzones
    pub async fn find_zone_by_name(&self, stack: &Stack, domain: &str) -> Result<Option<Zone>> {
        let page: ZonesPage = self
            .get_json(
                &format!("/dns/v1/stacks/{}/zones", stack.slug),
                &[("page_request.filter", format!("domain=\"{}\"", domain))],
            )
            .await?;

        Ok(page.zones.into_iter().next())
    }

    /// Create a CNAME record `name` -> `target` in `zone`
    ///
    /// See: https://stackpath.dev/reference/resource-records#createzonerecord
    pub async fn create_cname_record(
        &self,
        stack: &Stack,
        zone: &Zone,
        name: &str,
        target: &str,
    ) -> Result<()> {
        let request = CreateRecordRequest {
            record_type: "CNAME",
            name,
            data: target,
            ttl: CNAME_TTL,
        };

        tracing::info!("Creating CNAME record: {}.{} -> {}", name, zone.name, target);
        self.post(
            &format!("/dns/v1/stacks/{}/zones/{}/records", stack.slug, zone.id),
            &request,
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_name_comes_from_domain_field() {
        let zone: Zone =
            serde_json::from_str(r#"{"id":"z-1","domain":"example.com","nameservers":[]}"#).unwrap();
        assert_eq!(zone.name, "example.com");
    }

    #[test]
    fn test_cname_request_body() {
        let request = CreateRecordRequest {
            record_type: "CNAME",
            name: "demo",
            data: "abc123.stackpathcdn.com",
            ttl: CNAME_TTL,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "type": "CNAME",
                "name": "demo",
                "data": "abc123.stackpathcdn.com",
                "ttl": 60
            })
        );
    }
}
