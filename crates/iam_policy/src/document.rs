//! Policy document entry points.
//!
//! Construction goes raw tree → [`Validator`] → [`Policy`]; `normalize` goes
//! [`Policy`] → [`NormalizedPolicy`]; `to_value` turns either back into a
//! generic tree with absent fields omitted.

use crate::error::{Error, Result};
use crate::model::{NormalizedPolicy, Policy, Statement};
use crate::normalize::Normalize;
use crate::validate::Validator;
use serde_json::Value;
use xxhash_rust::xxh64::xxh64;

/// Seed for fingerprint hashing.
const FINGERPRINT_SEED: u64 = 0x4941_4D50_4F4C; // "IAMPOL" in hex

impl Policy {
    /// Validates a decoded policy tree with default options.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation, naming the offending field.
    ///
    /// # Example
    ///
    /// ```rust
    /// use iam_policy::Policy;
    /// use serde_json::json;
    ///
    /// let policy = Policy::from_value(&json!({
    ///     "Version": "2012-10-17",
    ///     "Statement": {"Effect": "Allow", "Action": "S3:GetObject", "Resource": "*"}
    /// }))
    /// .unwrap();
    ///
    /// let normalized = policy.normalize().to_value().unwrap();
    /// assert_eq!(normalized["Statement"][0]["Action"], json!(["s3:getobject"]));
    /// ```
    pub fn from_value(value: &Value) -> Result<Self> {
        Validator::new().validate_policy(value)
    }

    /// Produces the canonical form of this policy.
    #[must_use]
    pub fn normalize(&self) -> NormalizedPolicy {
        Normalize::normalize(self)
    }

    /// Serializes the policy in its authored shape.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON conversion fails.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The statements of the policy, whether authored bare or as a list.
    pub fn statements(&self) -> &[Statement] {
        self.statement.as_slice()
    }

    /// Returns true if both policies share a canonical form.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.normalize() == other.normalize()
    }
}

impl TryFrom<&Value> for Policy {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl TryFrom<Value> for Policy {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

impl Statement {
    /// Validates a decoded statement tree with default options.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation, naming the offending field.
    pub fn from_value(value: &Value) -> Result<Self> {
        Validator::new().validate_statement(value)
    }
}

impl NormalizedPolicy {
    /// Serializes the canonical policy.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON conversion fails.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Stable digest of the canonical form, for deduplication.
    ///
    /// Equivalent policies share a fingerprint. The digest covers the
    /// compact JSON encoding with keys in sorted order.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON conversion fails.
    pub fn fingerprint(&self) -> Result<u64> {
        let canonical = serde_json::to_string(&self.to_value()?)?;
        Ok(xxh64(canonical.as_bytes(), FINGERPRINT_SEED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalized(raw: &Value) -> Value {
        Policy::from_value(raw).unwrap().normalize().to_value().unwrap()
    }

    fn pretty(raw: &Value) -> String {
        serde_json::to_string_pretty(&normalized(raw)).unwrap()
    }

    #[test]
    fn parses_and_serializes_version() {
        for version in ["2008-10-17", "2012-10-17"] {
            let raw = json!({"Version": version, "Statement": []});
            let policy = Policy::from_value(&raw).unwrap();
            assert_eq!(policy.to_value().unwrap(), raw);
        }
    }

    #[test]
    fn minimal_statement_round_trips() {
        let raw = json!({"Statement": [{"Action": "*", "Effect": "Allow", "Resource": "*"}]});
        let policy = Policy::from_value(&raw).unwrap();
        assert_eq!(policy.to_value().unwrap()["Statement"], raw["Statement"]);
    }

    #[test]
    fn authored_shape_round_trips() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "MustBeEncryptedInTransit",
                "Action": "s3:*",
                "Effect": "Deny",
                "Resource": ["arn:aws:s3:::scranton-bucket", "arn:aws:s3:::scranton-bucket/*"],
                "Condition": {"Bool": {"aws:SecureTransport": [false]}},
                "Principal": {"AWS": ["*"]},
            }],
        });
        let policy = Policy::from_value(&raw).unwrap();
        assert_eq!(policy.to_value().unwrap(), raw);
    }

    #[test]
    fn serde_deserialization_runs_the_validator() {
        let policy: Policy = serde_json::from_str(
            r#"{"Id": "doc", "Statement": {"Effect": "Allow", "Action": "*", "Resource": "*"}}"#,
        )
        .unwrap();
        assert_eq!(policy.id.as_deref(), Some("doc"));
        assert_eq!(policy.statements().len(), 1);

        let err = serde_json::from_str::<Policy>(
            r#"{"Statement": {"Effect": "Maybe", "Action": "*", "Resource": "*"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Effect"), "{err}");
    }

    #[test]
    fn try_from_reports_missing_statement() {
        let err = Policy::try_from(json!({"Version": "2012-10-17"})).unwrap_err();
        assert!(err.to_string().contains("Statement"));
    }

    #[test]
    fn single_statement_is_wrapped() {
        insta::assert_snapshot!(pretty(&json!({
            "Version": "2012-10-17",
            "Statement": {"Effect": "Allow", "Action": ["s3:PutObject"], "Resource": ["*"]},
        })), @r#"
        {
          "Statement": [
            {
              "Action": [
                "s3:putobject"
              ],
              "Effect": "Allow",
              "Resource": [
                "*"
              ]
            }
          ],
          "Version": "2012-10-17"
        }
        "#);
    }

    #[test]
    fn condition_scalars_become_strings() {
        insta::assert_snapshot!(pretty(&json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Action": "s3:putobject",
                "Resource": "*",
                "Condition": {"StringEquals": {"AWS:Username": [true, 20.15]}},
            }],
        })), @r#"
        {
          "Statement": [
            {
              "Action": [
                "s3:putobject"
              ],
              "Condition": {
                "StringEquals": {
                  "aws:username": [
                    "true",
                    "20.15"
                  ]
                }
              },
              "Effect": "Allow",
              "Resource": [
                "*"
              ]
            }
          ],
          "Version": "2012-10-17"
        }
        "#);
    }

    #[test]
    fn wildcard_principal_and_bare_condition() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "MustBeEncryptedInTransit",
                "Action": "s3:*",
                "Effect": "Deny",
                "Resource": ["arn:aws:s3:::scranton-bucket", "arn:aws:s3:::scranton-bucket/*"],
                "Condition": {"Bool": {"aws:SecureTransport": "false"}},
                "Principal": "*",
            }],
        });
        assert_eq!(
            normalized(&raw),
            json!({
                "Statement": [{
                    "Action": ["s3:*"],
                    "Condition": {"Bool": {"aws:securetransport": ["false"]}},
                    "Effect": "Deny",
                    "Principal": {"AWS": ["*"]},
                    "Resource": ["arn:aws:s3:::scranton-bucket", "arn:aws:s3:::scranton-bucket/*"],
                    "Sid": "MustBeEncryptedInTransit",
                }],
                "Version": "2012-10-17",
            })
        );
    }

    #[test]
    fn principal_object_fields_become_lists() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Action": "s3:putobject",
                "Principal": {"Service": "cloudtrail.amazonaws.com", "AWS": "arn:aws:iam::012345678901:root"},
                "Resource": ["*"],
            }],
        });
        assert_eq!(
            normalized(&raw),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["s3:putobject"],
                    "Principal": {
                        "AWS": ["arn:aws:iam::012345678901:root"],
                        "Service": ["cloudtrail.amazonaws.com"],
                    },
                    "Resource": ["*"],
                }],
            })
        );
    }

    #[test]
    fn visual_editor_actions_are_sorted() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "VisualEditor0",
                "Effect": "Allow",
                "Action": ["s3:List*", "s3:GetObject*", "s3:PutObject", "ec2:DESCRIBE*", "ec2:list*"],
                "Resource": "*",
            }],
        });
        assert_eq!(
            normalized(&raw),
            json!({
                "Statement": [{
                    "Action": ["ec2:describe*", "ec2:list*", "s3:getobject*", "s3:list*", "s3:putobject"],
                    "Effect": "Allow",
                    "Resource": ["*"],
                    "Sid": "VisualEditor0",
                }],
                "Version": "2012-10-17",
            })
        );
    }

    #[test]
    fn wildcard_principal_normalizes_to_aws_list() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Action": ["s3:putobject"], "Principal": "*", "Resource": ["*"]}],
        });
        assert_eq!(
            normalized(&raw)["Statement"][0]["Principal"],
            json!({"AWS": ["*"]})
        );
    }

    #[test]
    fn bare_action_and_resource_become_lists() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Action": "s3:putobject", "Resource": "*"}],
        });
        assert_eq!(
            normalized(&raw),
            json!({
                "Version": "2012-10-17",
                "Statement": [{"Effect": "Allow", "Action": ["s3:putobject"], "Resource": ["*"]}],
            })
        );
    }

    #[test]
    fn normalize_leaves_source_untouched() {
        let raw = json!({"Id": "doc", "Statement": {"Effect": "Allow", "Action": "S3:*", "Resource": "*"}});
        let policy = Policy::from_value(&raw).unwrap();
        let _ = policy.normalize();
        assert_eq!(policy.to_value().unwrap(), raw);
    }

    #[test]
    fn canonical_input_is_a_fixed_point() {
        let canonical = json!({
            "Id": "doc",
            "Version": "2012-10-17",
            "Statement": [{
                "Action": ["ec2:describe*", "s3:getobject"],
                "Condition": {"Bool": {"aws:securetransport": ["false"]}},
                "Effect": "Deny",
                "Principal": {"AWS": ["*"]},
                "Resource": ["arn:aws:s3:::a", "arn:aws:s3:::b"],
                "Sid": "Deny",
            }],
        });
        assert_eq!(normalized(&canonical), canonical);
    }

    #[test]
    fn equivalent_policies_share_a_fingerprint() {
        let authored = Policy::from_value(&json!({
            "Statement": {
                "Effect": "Allow",
                "Action": ["S3:PutObject", "s3:GetObject"],
                "Resource": "*",
                "Principal": "*",
            }
        }))
        .unwrap();
        let canonical = Policy::from_value(&json!({
            "Statement": [{
                "Effect": "Allow",
                "Action": ["s3:getobject", "s3:putobject"],
                "Resource": ["*"],
                "Principal": {"AWS": "*"},
            }]
        }))
        .unwrap();
        let other = Policy::from_value(&json!({
            "Statement": [{"Effect": "Deny", "Action": "s3:GetObject", "Resource": "*"}]
        }))
        .unwrap();

        assert!(authored.is_equivalent(&canonical));
        assert!(!authored.is_equivalent(&other));
        assert_eq!(
            authored.normalize().fingerprint().unwrap(),
            canonical.normalize().fingerprint().unwrap()
        );
        assert_ne!(
            authored.normalize().fingerprint().unwrap(),
            other.normalize().fingerprint().unwrap()
        );
    }

    #[test]
    fn statement_from_value() {
        let statement = Statement::from_value(&json!({
            "Effect": "Allow", "Action": "*", "Resource": "*"
        }))
        .unwrap();
        assert_eq!(statement.effect, crate::Effect::Allow);
        assert!(Statement::from_value(&json!({"Effect": "Allow"})).is_err());
    }
}
