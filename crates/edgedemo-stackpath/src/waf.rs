//! Web application firewall rules and request log

use crate::client::{ResultsPage, StackPathClient, query_time};
use crate::delivery::Site;
use crate::error::Result;
use crate::stack::Stack;
use chrono::{DateTime, Utc};
use edgedemo_monitor::SecurityEvent;
use serde::{Deserialize, Serialize};

/// What a rule does with a matching request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    Allow,
    Block,
}

/// A custom rule matching one exact URL path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WafRule {
    pub name: String,
    pub description: String,
    pub path: String,
    pub action: RuleAction,
}

impl WafRule {
    fn to_request(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "conditions": [{
                "url": { "url": self.path, "exactMatch": true }
            }],
            "action": self.action,
            "enabled": true
        })
    }
}

/// Block `/blockme` and always allow `/anything`
pub fn demo_rules() -> Vec<WafRule> {
    vec![
        WafRule {
            name: "block access to blockme".to_string(),
            description: "A simple path block to demo WAF capabilities".to_string(),
            path: "/blockme".to_string(),
            action: RuleAction::Block,
        },
        WafRule {
            name: "allow access to anything".to_string(),
            description: "Allow access to a path, regardless of other rules".to_string(),
            path: "/anything".to_string(),
            action: RuleAction::Allow,
        },
    ]
}

/// A request captured by the WAF and what it did with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WafRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub client_ip: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub rule_name: String,
    pub request_time: DateTime<Utc>,
}

impl From<WafRequest> for SecurityEvent {
    fn from(request: WafRequest) -> Self {
        SecurityEvent {
            id: request.id,
            timestamp: request.request_time,
            action: request.action,
            method: request.method,
            path: request.path,
            client_ip: request.client_ip,
            country: request.country,
            user_agent: request.user_agent,
            rule_name: Some(request.rule_name).filter(|name| !name.is_empty()),
        }
    }
}

impl StackPathClient {
    /// Add one custom rule to a site's WAF
    ///
    /// See: https://stackpath.dev/reference/rules#createrule
    pub async fn create_waf_rule(&self, stack: &Stack, site: &Site, rule: &WafRule) -> Result<()> {
        tracing::info!("Creating WAF rule \"{}\" on site {}", rule.name, site.id);
        self.post(
            &format!("/waf/v1/stacks/{}/sites/{}/rules", stack.slug, site.id),
            &rule.to_request(),
        )
        .await?;

        Ok(())
    }

    /// Install the [`demo_rules`] on a site
    pub async fn create_demo_waf_rules(&self, stack: &Stack, site: &Site) -> Result<()> {
        for rule in demo_rules() {
            self.create_waf_rule(stack, site, &rule).await?;
        }
        Ok(())
    }

    /// Requests the WAF saw from `since` until now
    ///
    /// See: https://stackpath.dev/reference/requests#getrequests
    pub async fn list_waf_requests(
        &self,
        stack: &Stack,
        site: &Site,
        since: DateTime<Utc>,
    ) -> Result<Vec<WafRequest>> {
        let page: ResultsPage<WafRequest> = self
            .get_json(
                &format!("/waf/v1/stacks/{}/sites/{}/requests", stack.slug, site.id),
                &[("start_date", query_time(since))],
            )
            .await?;

        Ok(page.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_rule_bodies() {
        let rules = demo_rules();
        assert_eq!(rules.len(), 2);

        let block = rules[0].to_request();
        assert_eq!(block["action"], "BLOCK");
        assert_eq!(block["conditions"][0]["url"]["url"], "/blockme");
        assert_eq!(block["conditions"][0]["url"]["exactMatch"], true);

        assert_eq!(rules[1].to_request()["action"], "ALLOW");
    }

    #[test]
    fn test_request_converts_to_security_event() {
        let request: WafRequest = serde_json::from_value(serde_json::json!({
            "id": "r-1",
            "action": "ALLOW",
            "method": "GET",
            "path": "/anything",
            "clientIp": "203.0.113.5",
            "country": "DE",
            "userAgent": "Mozilla/5.0",
            "ruleName": "",
            "requestTime": "2021-06-01T12:00:00Z"
        }))
        .unwrap();

        let event = SecurityEvent::from(request);
        assert_eq!(event.client_ip, "203.0.113.5");
        assert_eq!(event.rule_name, None);
        assert_eq!(event.timestamp.to_rfc3339(), "2021-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_request_without_id_still_decodes() {
        let request: WafRequest = serde_json::from_value(serde_json::json!({
            "clientIp": "203.0.113.5",
            "requestTime": "2021-06-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(request.id, "");
        assert_eq!(request.action, "");
        assert_eq!(request.client_ip, "203.0.113.5");
    }
}
