//! SCIM 1.0 example documents used across the test suite.

/// Documents in the style of the SCIM 1.0 core schema examples.
pub mod scim_examples {
    use serde_json::{Value, json};

    pub fn user_minimal() -> Value {
        json!({
            "schemas": ["urn:scim:schemas:core:1.0"],
            "userName": "bjensen"
        })
    }

    pub fn user_full() -> Value {
        json!({
            "schemas": [
                "urn:scim:schemas:core:1.0",
                "urn:scim:schemas:extension:enterprise:1.0"
            ],
            "userName": "bjensen",
            "name": {
                "formatted": "Ms. Barbara J Jensen III",
                "familyName": "Jensen",
                "givenName": "Barbara"
            },
            "displayName": "Babs Jensen",
            "title": "Tour Guide",
            "userType": "Employee",
            "preferredLanguage": "en-US",
            "emails": [
                { "value": "bjensen@example.com", "type": "work", "primary": true },
                { "value": "babs@jensen.org", "type": "home" }
            ],
            "phoneNumbers": [
                { "value": "+1 555 555 5555", "type": "work" },
                { "value": "+1 555 555 4444", "type": "mobile" }
            ],
            "addresses": [
                {
                    "type": "work",
                    "streetAddress": "100 Universal City Plaza",
                    "locality": "Hollywood",
                    "region": "CA",
                    "postalCode": "91608"
                }
            ],
            "urn:scim:schemas:extension:enterprise:1.0": {
                "employeeNumber": "701984",
                "organization": "Universal Studios",
                "department": "Tour Operations"
            }
        })
    }

    pub fn group_basic() -> Value {
        json!({
            "schemas": ["urn:scim:schemas:core:1.0"],
            "displayName": "Tour Guides"
        })
    }

    pub fn user_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<scim:User xmlns:scim="urn:scim:schemas:core:1.0"
           xmlns:enterprise="urn:scim:schemas:extension:enterprise:1.0">
  <scim:userName>bjensen</scim:userName>
  <scim:name>
    <scim:formatted>Ms. Barbara J Jensen III</scim:formatted>
    <scim:familyName>Jensen</scim:familyName>
    <scim:givenName>Barbara</scim:givenName>
  </scim:name>
  <scim:emails>
    <scim:email>
      <scim:value>bjensen@example.com</scim:value>
      <scim:type>work</scim:type>
      <scim:primary>true</scim:primary>
    </scim:email>
  </scim:emails>
  <enterprise:employeeNumber>701984</enterprise:employeeNumber>
</scim:User>"#
    }
}

/// A mapping that exposes users read-only from a different suffix.
pub fn read_only_mapping() -> &'static str {
    r#"{
  "resources": [
    {
      "resource": "User",
      "searchBaseDn": "ou=People,dc=example,dc=com",
      "searchObjectClasses": ["inetOrgPerson"],
      "attributes": [
        { "name": "userName", "kind": "simple", "ldapAttribute": "uid" },
        { "name": "displayName", "kind": "simple", "ldapAttribute": "cn" }
      ]
    }
  ]
}"#
}
