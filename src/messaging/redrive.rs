//! Dead-letter target resolution.
//!
//! SQS returns the `RedrivePolicy` queue attribute as a JSON string naming the
//! dead-letter queue by ARN, while every queue operation wants a URL.

use serde::Deserialize;

use super::errors::MessagingError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedrivePolicy {
    dead_letter_target_arn: String,
    /// SQS has reported this both as a number and as a string
    #[serde(default)]
    max_receive_count: Option<serde_json::Value>,
}

/// Where a message lands after exhausting its receive count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterTarget {
    pub arn: String,
    pub url: String,
    pub max_receive_count: Option<u32>,
}

impl DeadLetterTarget {
    /// Parse the raw `RedrivePolicy` attribute
    pub fn from_policy(policy: &str) -> Result<Self, MessagingError> {
        let policy: RedrivePolicy = serde_json::from_str(policy)
            .map_err(|e| MessagingError::redrive_policy(e.to_string()))?;

        let arn = QueueArn::parse(&policy.dead_letter_target_arn)?;
        let max_receive_count = policy.max_receive_count.and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Ok(Self {
            url: arn.queue_url(),
            arn: policy.dead_letter_target_arn,
            max_receive_count,
        })
    }
}

/// `arn:<partition>:sqs:<region>:<account>:<queue>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueArn {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    pub queue_name: String,
}

impl QueueArn {
    pub fn parse(arn: &str) -> Result<Self, MessagingError> {
        let fields: Vec<&str> = arn.split(':').collect();
        match fields.as_slice() {
            ["arn", partition, "sqs", region, account_id, queue_name]
                if !region.is_empty() && !account_id.is_empty() && !queue_name.is_empty() =>
            {
                Ok(Self {
                    partition: (*partition).to_string(),
                    region: (*region).to_string(),
                    account_id: (*account_id).to_string(),
                    queue_name: (*queue_name).to_string(),
                })
            }
            _ => Err(MessagingError::redrive_policy(format!(
                "'{arn}' is not an SQS queue ARN"
            ))),
        }
    }

    pub fn queue_url(&self) -> String {
        let domain = match self.partition.as_str() {
            "aws-cn" => "amazonaws.com.cn",
            _ => "amazonaws.com",
        };
        format!(
            "https://sqs.{}.{}/{}/{}",
            self.region, domain, self.account_id, self.queue_name
        )
    }
}
