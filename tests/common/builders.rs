//! Test data builders for SCIM 1.0 resources.
//!
//! Fluent builders produce JSON documents that can be modified step by step
//! to exercise a particular mapping or failure.

use serde_json::{Value, json};

pub const CORE_SCHEMA: &str = "urn:scim:schemas:core:1.0";
pub const ENTERPRISE_SCHEMA: &str = "urn:scim:schemas:extension:enterprise:1.0";

/// Builder for User documents.
#[derive(Debug, Clone)]
pub struct UserBuilder {
    data: Value,
}

impl UserBuilder {
    /// A minimal valid user.
    pub fn new(user_name: &str) -> Self {
        Self {
            data: json!({
                "schemas": [CORE_SCHEMA],
                "userName": user_name
            }),
        }
    }

    pub fn with_name(mut self, formatted: &str, family_name: &str, given_name: &str) -> Self {
        self.data["name"] = json!({
            "formatted": formatted,
            "familyName": family_name,
            "givenName": given_name
        });
        self
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.data["displayName"] = json!(display_name);
        self
    }

    pub fn with_email(mut self, value: &str, email_type: Option<&str>, primary: bool) -> Self {
        let mut email = json!({ "value": value });
        if let Some(t) = email_type {
            email["type"] = json!(t);
        }
        if primary {
            email["primary"] = json!(true);
        }
        self.push("emails", email);
        self
    }

    pub fn with_phone_number(mut self, value: &str, phone_type: &str) -> Self {
        self.push("phoneNumbers", json!({ "value": value, "type": phone_type }));
        self
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.enterprise()["department"] = json!(department);
        self
    }

    pub fn with_employee_number(mut self, number: &str) -> Self {
        self.enterprise()["employeeNumber"] = json!(number);
        self
    }

    /// Set an arbitrary attribute.
    pub fn with_attribute(mut self, name: &str, value: Value) -> Self {
        self.data[name] = value;
        self
    }

    /// Remove an attribute.
    pub fn without(mut self, name: &str) -> Self {
        if let Some(object) = self.data.as_object_mut() {
            object.remove(name);
        }
        self
    }

    pub fn build(self) -> Value {
        self.data
    }

    fn push(&mut self, name: &str, value: Value) {
        match self.data[name].as_array_mut() {
            Some(values) => values.push(value),
            None => self.data[name] = json!([value]),
        }
    }

    fn enterprise(&mut self) -> &mut Value {
        let declared = self.data["schemas"]
            .as_array()
            .is_some_and(|schemas| schemas.iter().any(|s| s == ENTERPRISE_SCHEMA));
        if !declared {
            if let Some(schemas) = self.data["schemas"].as_array_mut() {
                schemas.push(json!(ENTERPRISE_SCHEMA));
            }
        }
        if !self.data[ENTERPRISE_SCHEMA].is_object() {
            self.data[ENTERPRISE_SCHEMA] = json!({});
        }
        &mut self.data[ENTERPRISE_SCHEMA]
    }
}

/// Builder for Group documents.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    data: Value,
}

impl GroupBuilder {
    pub fn new(display_name: &str) -> Self {
        Self {
            data: json!({
                "schemas": [CORE_SCHEMA],
                "displayName": display_name
            }),
        }
    }

    /// Add a member by id (the member's DN).
    pub fn with_member(mut self, id: &str) -> Self {
        let member = json!({ "value": id });
        match self.data["members"].as_array_mut() {
            Some(members) => members.push(member),
            None => self.data["members"] = json!([member]),
        }
        self
    }

    pub fn build(self) -> Value {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_builder_declares_extension_once() {
        let user = UserBuilder::new("bjensen")
            .with_department("Tour Operations")
            .with_employee_number("701984")
            .build();
        assert_eq!(user["schemas"].as_array().unwrap().len(), 2);
        assert_eq!(user[ENTERPRISE_SCHEMA]["department"], "Tour Operations");
    }

    #[test]
    fn test_group_builder_members() {
        let group = GroupBuilder::new("admins").with_member("uid=a").with_member("uid=b").build();
        assert_eq!(group["members"].as_array().unwrap().len(), 2);
    }
}
