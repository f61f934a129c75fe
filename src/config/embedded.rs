//! Embedded default mapping configuration.

/// Maps the SCIM 1.0 User (with the enterprise extension) and Group onto
/// `inetOrgPerson` and `groupOfUniqueNames` entries below
/// `dc=example,dc=com`.
pub fn default_mapping() -> &'static str {
    r#"{
  "resources": [
    {
      "resource": "User",
      "searchBaseDn": "ou=People,dc=example,dc=com",
      "objectClasses": ["top", "person", "organizationalPerson", "inetOrgPerson"],
      "searchObjectClasses": ["inetOrgPerson"],
      "rdnAttribute": "uid",
      "attributes": [
        { "name": "userName", "kind": "simple", "ldapAttribute": "uid" },
        {
          "name": "name",
          "kind": "complex",
          "clearOnAbsence": true,
          "subAttributes": [
            { "name": "formatted", "ldapAttribute": "cn" },
            { "name": "familyName", "ldapAttribute": "sn" },
            { "name": "givenName", "ldapAttribute": "givenName" }
          ]
        },
        { "name": "displayName", "kind": "simple", "ldapAttribute": "displayName", "clearOnAbsence": true },
        { "name": "title", "kind": "simple", "ldapAttribute": "title", "clearOnAbsence": true },
        { "name": "userType", "kind": "simple", "ldapAttribute": "employeeType", "clearOnAbsence": true },
        { "name": "preferredLanguage", "kind": "simple", "ldapAttribute": "preferredLanguage", "clearOnAbsence": true },
        {
          "name": "emails",
          "kind": "plural",
          "clearOnAbsence": true,
          "canonicalValues": [
            { "type": "work", "subAttributes": [ { "name": "value", "ldapAttribute": "mail" } ] }
          ]
        },
        {
          "name": "phoneNumbers",
          "kind": "plural",
          "clearOnAbsence": true,
          "canonicalValues": [
            { "type": "work", "subAttributes": [ { "name": "value", "ldapAttribute": "telephoneNumber", "transformation": "telephoneNumber" } ] },
            { "type": "mobile", "subAttributes": [ { "name": "value", "ldapAttribute": "mobile", "transformation": "telephoneNumber" } ] },
            { "type": "fax", "subAttributes": [ { "name": "value", "ldapAttribute": "facsimileTelephoneNumber", "transformation": "telephoneNumber" } ] },
            { "type": "pager", "subAttributes": [ { "name": "value", "ldapAttribute": "pager", "transformation": "telephoneNumber" } ] },
            { "type": "home", "subAttributes": [ { "name": "value", "ldapAttribute": "homePhone", "transformation": "telephoneNumber" } ] }
          ]
        },
        {
          "name": "addresses",
          "kind": "plural",
          "clearOnAbsence": true,
          "canonicalValues": [
            {
              "type": "work",
              "subAttributes": [
                { "name": "formatted", "ldapAttribute": "postalAddress", "transformation": "postalAddress" },
                { "name": "streetAddress", "ldapAttribute": "street" },
                { "name": "locality", "ldapAttribute": "l" },
                { "name": "region", "ldapAttribute": "st" },
                { "name": "postalCode", "ldapAttribute": "postalCode" }
              ]
            },
            {
              "type": "home",
              "subAttributes": [
                { "name": "formatted", "ldapAttribute": "homePostalAddress", "transformation": "postalAddress" }
              ]
            }
          ]
        },
        {
          "name": "x509Certificates",
          "kind": "plural",
          "clearOnAbsence": true,
          "canonicalValues": [
            { "subAttributes": [ { "name": "value", "ldapAttribute": "userCertificate" } ] }
          ]
        },
        { "name": "groups", "kind": "derived", "derivation": "groups", "searchBaseDn": "ou=Groups,dc=example,dc=com" },
        {
          "schema": "urn:scim:schemas:extension:enterprise:1.0",
          "name": "employeeNumber",
          "kind": "simple",
          "ldapAttribute": "employeeNumber"
        },
        {
          "schema": "urn:scim:schemas:extension:enterprise:1.0",
          "name": "organization",
          "kind": "simple",
          "ldapAttribute": "o",
          "clearOnAbsence": true
        },
        {
          "schema": "urn:scim:schemas:extension:enterprise:1.0",
          "name": "department",
          "kind": "simple",
          "ldapAttribute": "departmentNumber",
          "clearOnAbsence": true
        },
        {
          "schema": "urn:scim:schemas:extension:enterprise:1.0",
          "name": "manager",
          "kind": "complex",
          "clearOnAbsence": true,
          "subAttributes": [ { "name": "managerId", "ldapAttribute": "manager" } ]
        }
      ]
    },
    {
      "resource": "Group",
      "searchBaseDn": "ou=Groups,dc=example,dc=com",
      "objectClasses": ["top", "groupOfUniqueNames"],
      "searchObjectClasses": ["groupOfUniqueNames", "groupOfNames", "groupOfURLs"],
      "rdnAttribute": "cn",
      "requiredDirectoryAttributes": ["cn"],
      "attributes": [
        { "name": "displayName", "kind": "simple", "ldapAttribute": "cn" },
        {
          "name": "members",
          "kind": "references",
          "clearOnAbsence": true,
          "ldapAttributes": ["uniqueMember", "member"],
          "memberUrlAttribute": "memberURL"
        }
      ]
    }
  ]
}"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(default_mapping()).unwrap();
        assert_eq!(value["resources"].as_array().unwrap().len(), 2);
    }
}
