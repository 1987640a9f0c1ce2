//! Google People adapter: saved connections plus "other contacts".

use actionstage_config::GoogleConfig;
use actionstage_core::adapter::{Contact, ContactType, Contacts};
use actionstage_core::error::AdapterError;
use async_trait::async_trait;

use crate::http;

const SERVICE: &str = "contacts";
const PAGE_SIZE: &str = "100";

pub struct GooglePeople {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl GooglePeople {
    pub fn new(config: &GoogleConfig, access_token: impl Into<String>) -> Self {
        Self {
            base_url: http::trim_base(&config.people_url),
            access_token: access_token.into(),
            client: http::client(),
        }
    }
}

/// Extract contacts from a People API person list.
///
/// Entries without an email are skipped. Saved connections also need a
/// name; other contacts without one are called "Unknown".
pub(crate) fn parse_people(people: &serde_json::Value, contact_type: ContactType) -> Vec<Contact> {
    let first = |person: &serde_json::Value, field: &str, key: &str| -> Option<String> {
        person
            .get(field)
            .and_then(|v| v.as_array())
            .and_then(|items| items.first())
            .and_then(|item| item.get(key))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    people
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|person| {
                    let email = first(person, "emailAddresses", "value")?;
                    let name = match (first(person, "names", "displayName"), contact_type) {
                        (Some(name), _) => name,
                        (None, ContactType::Other) => "Unknown".to_string(),
                        (None, ContactType::Contact) => return None,
                    };
                    Some(Contact { name, email, contact_type })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn filter_contacts(contacts: Vec<Contact>, query: Option<&str>) -> Vec<Contact> {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => contacts.into_iter().filter(|c| c.matches(q)).collect(),
        None => contacts,
    }
}

#[async_trait]
impl Contacts for GooglePeople {
    fn name(&self) -> &str {
        "google_people"
    }

    async fn get_contacts(&self, query: Option<&str>) -> Result<Vec<Contact>, AdapterError> {
        let connections = http::send_json(
            SERVICE,
            self.client
                .get(format!("{}/people/me/connections", self.base_url))
                .bearer_auth(&self.access_token)
                .query(&[("pageSize", PAGE_SIZE), ("personFields", "names,emailAddresses")]),
        )
        .await?;

        let others = http::send_json(
            SERVICE,
            self.client
                .get(format!("{}/otherContacts", self.base_url))
                .bearer_auth(&self.access_token)
                .query(&[("pageSize", PAGE_SIZE), ("readMask", "names,emailAddresses")]),
        )
        .await?;

        let mut contacts = parse_people(&connections["connections"], ContactType::Contact);
        contacts.extend(parse_people(&others["otherContacts"], ContactType::Other));
        Ok(filter_contacts(contacts, query))
    }
}
