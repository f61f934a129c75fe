//! Embedded SCIM 1.0 resource descriptors.
//!
//! The core User and Group descriptors and the enterprise user extension are
//! embedded as static JSON documents so a registry can be built without any
//! descriptor files on disk.

/// Returns the core User resource descriptor as a JSON string.
pub fn core_user_descriptor() -> &'static str {
    r#"{
  "name": "User",
  "description": "SCIM core user",
  "endpoint": "Users",
  "schema": "urn:scim:schemas:core:1.0",
  "attributes": [
    {
      "name": "id",
      "type": "string",
      "readOnly": true,
      "caseExact": true,
      "description": "Unique identifier for the SCIM resource as defined by the service provider"
    },
    {
      "name": "externalId",
      "type": "string",
      "caseExact": true,
      "description": "Unique identifier for the resource as defined by the service consumer"
    },
    {
      "name": "userName",
      "type": "string",
      "required": true,
      "description": "Unique identifier for the user, typically used to authenticate to the service provider"
    },
    {
      "name": "name",
      "type": "complex",
      "description": "The components of the user's real name",
      "subAttributes": [
        {
          "name": "formatted",
          "type": "string",
          "description": "The full name, including all middle names, titles, and suffixes as appropriate"
        },
        {
          "name": "familyName",
          "type": "string",
          "description": "The family name of the user"
        },
        {
          "name": "givenName",
          "type": "string",
          "description": "The given name of the user"
        },
        {
          "name": "middleName",
          "type": "string",
          "description": "The middle name(s) of the user"
        },
        {
          "name": "honorificPrefix",
          "type": "string",
          "description": "The honorific prefix(es) of the user"
        },
        {
          "name": "honorificSuffix",
          "type": "string",
          "description": "The honorific suffix(es) of the user"
        }
      ]
    },
    {
      "name": "displayName",
      "type": "string",
      "description": "The name of the user, suitable for display to end-users"
    },
    {
      "name": "nickName",
      "type": "string",
      "description": "The casual way to address the user"
    },
    {
      "name": "profileUrl",
      "type": "string",
      "caseExact": true,
      "description": "URL to a page representing the user's online profile"
    },
    {
      "name": "title",
      "type": "string",
      "description": "The user's title, such as \"Vice President\""
    },
    {
      "name": "userType",
      "type": "string",
      "description": "Used to identify the organization to user relationship"
    },
    {
      "name": "preferredLanguage",
      "type": "string",
      "description": "The user's preferred written or spoken language"
    },
    {
      "name": "locale",
      "type": "string",
      "description": "Used to indicate the user's default location"
    },
    {
      "name": "timezone",
      "type": "string",
      "description": "The user's time zone in the Olson timezone database format"
    },
    {
      "name": "active",
      "type": "boolean",
      "description": "The user's administrative status"
    },
    {
      "name": "password",
      "type": "string",
      "caseExact": true,
      "description": "The user's clear text password"
    },
    {
      "name": "emails",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "email",
      "description": "E-mail addresses for the user",
      "subAttributes": [
        {
          "name": "value",
          "type": "string",
          "description": "The value of the attribute"
        },
        {
          "name": "display",
          "type": "string",
          "description": "A human readable name, primarily used for display purposes"
        },
        {
          "name": "type",
          "type": "string",
          "description": "A label indicating the attribute's function"
        },
        {
          "name": "primary",
          "type": "boolean",
          "description": "Whether this is the preferred value"
        }
      ],
      "canonicalValues": [
        "work",
        "home",
        "other"
      ]
    },
    {
      "name": "phoneNumbers",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "phoneNumber",
      "description": "Phone numbers for the user",
      "subAttributes": [
        {
          "name": "value",
          "type": "string",
          "description": "The value of the attribute"
        },
        {
          "name": "display",
          "type": "string",
          "description": "A human readable name, primarily used for display purposes"
        },
        {
          "name": "type",
          "type": "string",
          "description": "A label indicating the attribute's function"
        },
        {
          "name": "primary",
          "type": "boolean",
          "description": "Whether this is the preferred value"
        }
      ],
      "canonicalValues": [
        "work",
        "home",
        "mobile",
        "fax",
        "pager",
        "other"
      ]
    },
    {
      "name": "ims",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "im",
      "description": "Instant messaging address for the user",
      "subAttributes": [
        {
          "name": "value",
          "type": "string",
          "description": "The value of the attribute"
        },
        {
          "name": "display",
          "type": "string",
          "description": "A human readable name, primarily used for display purposes"
        },
        {
          "name": "type",
          "type": "string",
          "description": "A label indicating the attribute's function"
        },
        {
          "name": "primary",
          "type": "boolean",
          "description": "Whether this is the preferred value"
        }
      ],
      "canonicalValues": [
        "aim",
        "gtalk",
        "icq",
        "xmpp",
        "msn",
        "skype",
        "qq",
        "yahoo"
      ]
    },
    {
      "name": "photos",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "photo",
      "description": "URL of photos of the user",
      "subAttributes": [
        {
          "name": "value",
          "type": "string",
          "description": "The value of the attribute"
        },
        {
          "name": "display",
          "type": "string",
          "description": "A human readable name, primarily used for display purposes"
        },
        {
          "name": "type",
          "type": "string",
          "description": "A label indicating the attribute's function"
        },
        {
          "name": "primary",
          "type": "boolean",
          "description": "Whether this is the preferred value"
        }
      ],
      "canonicalValues": [
        "photo",
        "thumbnail"
      ]
    },
    {
      "name": "addresses",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "address",
      "description": "A physical mailing address for this user",
      "subAttributes": [
        {
          "name": "type",
          "type": "string",
          "description": "The type of address"
        },
        {
          "name": "formatted",
          "type": "string",
          "description": "The full mailing address, formatted for display"
        },
        {
          "name": "streetAddress",
          "type": "string",
          "description": "The full street address component"
        },
        {
          "name": "locality",
          "type": "string",
          "description": "The city or locality component"
        },
        {
          "name": "region",
          "type": "string",
          "description": "The state or region component"
        },
        {
          "name": "postalCode",
          "type": "string",
          "description": "The zipcode or postal code component"
        },
        {
          "name": "country",
          "type": "string",
          "description": "The country name component"
        },
        {
          "name": "primary",
          "type": "boolean",
          "description": "Whether this is the preferred address"
        }
      ],
      "canonicalValues": [
        "work",
        "home",
        "other"
      ]
    },
    {
      "name": "groups",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "group",
      "description": "A list of groups that the user belongs to",
      "subAttributes": [
        {
          "name": "value",
          "type": "string",
          "readOnly": true,
          "caseExact": true,
          "description": "The identifier of the user's group"
        },
        {
          "name": "display",
          "type": "string",
          "readOnly": true,
          "description": "A human readable name for the group"
        },
        {
          "name": "type",
          "type": "string",
          "readOnly": true,
          "description": "How the group membership was derived"
        }
      ],
      "readOnly": true,
      "canonicalValues": [
        "direct",
        "indirect"
      ]
    },
    {
      "name": "x509Certificates",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "x509Certificate",
      "description": "A list of certificates issued to the user",
      "subAttributes": [
        {
          "name": "value",
          "type": "binary",
          "description": "The value of the attribute"
        },
        {
          "name": "display",
          "type": "string",
          "description": "A human readable name, primarily used for display purposes"
        },
        {
          "name": "type",
          "type": "string",
          "description": "A label indicating the attribute's function"
        },
        {
          "name": "primary",
          "type": "boolean",
          "description": "Whether this is the preferred value"
        }
      ]
    },
    {
      "name": "meta",
      "type": "complex",
      "readOnly": true,
      "description": "A complex attribute containing resource metadata",
      "subAttributes": [
        {
          "name": "created",
          "type": "dateTime",
          "readOnly": true,
          "description": "The date and time the resource was added to the service provider"
        },
        {
          "name": "lastModified",
          "type": "dateTime",
          "readOnly": true,
          "description": "The most recent date and time the details of this resource were updated"
        },
        {
          "name": "location",
          "type": "string",
          "readOnly": true,
          "caseExact": true,
          "description": "The URI of the resource being returned"
        },
        {
          "name": "version",
          "type": "string",
          "readOnly": true,
          "caseExact": true,
          "description": "The version of the resource being returned"
        }
      ]
    }
  ]
}"#
}

/// Returns the core Group resource descriptor as a JSON string.
pub fn core_group_descriptor() -> &'static str {
    r#"{
  "name": "Group",
  "description": "SCIM core group",
  "endpoint": "Groups",
  "schema": "urn:scim:schemas:core:1.0",
  "attributes": [
    {
      "name": "id",
      "type": "string",
      "readOnly": true,
      "caseExact": true,
      "description": "Unique identifier for the SCIM resource as defined by the service provider"
    },
    {
      "name": "externalId",
      "type": "string",
      "caseExact": true,
      "description": "Unique identifier for the resource as defined by the service consumer"
    },
    {
      "name": "displayName",
      "type": "string",
      "required": true,
      "description": "A human readable name for the group"
    },
    {
      "name": "members",
      "type": "complex",
      "multiValued": true,
      "multiValuedChildName": "member",
      "description": "A list of members of the group",
      "subAttributes": [
        {
          "name": "value",
          "type": "string",
          "caseExact": true,
          "description": "Identifier of the member of this group"
        },
        {
          "name": "display",
          "type": "string",
          "description": "A human readable name for the member"
        },
        {
          "name": "type",
          "type": "string",
          "description": "A label indicating the type of resource, e.g. User or Group"
        }
      ],
      "canonicalValues": [
        "User",
        "Group"
      ]
    },
    {
      "name": "meta",
      "type": "complex",
      "readOnly": true,
      "description": "A complex attribute containing resource metadata",
      "subAttributes": [
        {
          "name": "created",
          "type": "dateTime",
          "readOnly": true,
          "description": "The date and time the resource was added to the service provider"
        },
        {
          "name": "lastModified",
          "type": "dateTime",
          "readOnly": true,
          "description": "The most recent date and time the details of this resource were updated"
        },
        {
          "name": "location",
          "type": "string",
          "readOnly": true,
          "caseExact": true,
          "description": "The URI of the resource being returned"
        },
        {
          "name": "version",
          "type": "string",
          "readOnly": true,
          "caseExact": true,
          "description": "The version of the resource being returned"
        }
      ]
    }
  ]
}"#
}

/// Returns the enterprise user schema extension as a JSON string.
pub fn enterprise_user_extension() -> &'static str {
    r#"{
  "schema": "urn:scim:schemas:extension:enterprise:1.0",
  "name": "EnterpriseUser",
  "resourceTypes": [
    "User"
  ],
  "attributes": [
    {
      "name": "employeeNumber",
      "type": "string",
      "description": "Numeric or alphanumeric identifier assigned to a person"
    },
    {
      "name": "costCenter",
      "type": "string",
      "description": "Identifies the name of a cost center"
    },
    {
      "name": "organization",
      "type": "string",
      "description": "Identifies the name of an organization"
    },
    {
      "name": "division",
      "type": "string",
      "description": "Identifies the name of a division"
    },
    {
      "name": "department",
      "type": "string",
      "description": "Identifies the name of a department"
    },
    {
      "name": "manager",
      "type": "complex",
      "description": "The user's manager",
      "subAttributes": [
        {
          "name": "managerId",
          "type": "string",
          "description": "The id of the SCIM resource representing the user's manager"
        },
        {
          "name": "displayName",
          "type": "string",
          "readOnly": true,
          "description": "The displayName of the user's manager"
        }
      ]
    }
  ]
}"#
}
