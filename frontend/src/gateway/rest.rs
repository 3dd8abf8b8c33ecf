//! REST adapter speaking PostgREST conventions over `gloo-net`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{DataGateway, GatewayError};
use crate::config::GatewayConfig;
use crate::model::{
    Amount, NewTarget, NewTransaction, OwnerDisplay, Profile, ProfileId, Target, TargetId,
    TargetPatch, Transaction, TransactionId, TransactionKind, TransactionPatch,
};

const USERS: &str = "users";
const TRANSACTIONS: &str = "transactions";
const TARGETS: &str = "targets";

const TRANSACTION_SELECT: &str = "*,users(name,color)";

#[derive(Deserialize)]
struct UserRow {
    id: String,
    name: String,
    #[serde(default)]
    color: String,
    #[serde(default)]
    avatar: Option<String>,
}

impl From<UserRow> for Profile {
    fn from(row: UserRow) -> Self {
        Self {
            id: ProfileId::new(row.id),
            name: row.name,
            color_token: row.color,
            avatar: row.avatar,
        }
    }
}

#[derive(Deserialize)]
struct OwnerRow {
    name: String,
    #[serde(default)]
    color: String,
}

#[derive(Deserialize)]
struct TransactionRow {
    id: String,
    user_id: String,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: i64,
    #[serde(default)]
    note: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    users: Option<OwnerRow>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = GatewayError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let amount = Amount::new(row.amount).map_err(|err| {
            GatewayError::decode(format!("transaction {}: {err}", row.id))
        })?;
        Ok(Self {
            id: TransactionId::new(row.id),
            owner_id: ProfileId::new(row.user_id),
            kind: row.kind,
            amount,
            note: row.note,
            created_at: row.created_at,
            owner_display: row.users.map(|owner| OwnerDisplay {
                name: owner.name,
                color_token: owner.color,
            }),
        })
    }
}

#[derive(Deserialize)]
struct TargetRow {
    id: String,
    user_id: String,
    target_amount: i64,
    target_months: u32,
    start_date: NaiveDate,
    updated_at: DateTime<Utc>,
}

impl From<TargetRow> for Target {
    fn from(row: TargetRow) -> Self {
        Self {
            id: TargetId::new(row.id),
            owner_id: ProfileId::new(row.user_id),
            target_amount: row.target_amount,
            target_months: row.target_months,
            start_date: row.start_date,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Serialize)]
struct TransactionInsert<'a> {
    user_id: &'a str,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: i64,
    note: Option<&'a str>,
}

#[derive(Serialize)]
struct TransactionUpdate<'a> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<i64>,
    /// `Some(None)` writes SQL null.
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<Option<&'a str>>,
}

impl<'a> From<&'a TransactionPatch> for TransactionUpdate<'a> {
    fn from(patch: &'a TransactionPatch) -> Self {
        Self {
            kind: patch.kind,
            amount: patch.amount.map(Amount::get),
            note: patch.note.as_deref().map(|note| {
                let note = note.trim();
                (!note.is_empty()).then_some(note)
            }),
        }
    }
}

#[derive(Serialize)]
struct TargetInsert<'a> {
    user_id: &'a str,
    target_amount: i64,
    target_months: u32,
    start_date: NaiveDate,
}

#[derive(Serialize)]
struct TargetUpdate {
    target_amount: i64,
    target_months: u32,
    start_date: NaiveDate,
    updated_at: DateTime<Utc>,
}

/// Gateway backed by the hosted REST endpoint.
#[derive(Clone, Debug)]
pub struct RestGateway {
    config: GatewayConfig,
}

impl RestGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    fn url(&self, table: &str, query: &[(&str, String)]) -> String {
        let base = self.config.table_url(table);
        if query.is_empty() {
            return base;
        }
        let query = query
            .iter()
            .map(|(key, value)| {
                let value: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("{key}={value}")
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{base}?{query}")
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .header("Authorization", &format!("Bearer {}", self.config.api_key))
    }

    /// Ask the backend to echo affected rows so empty writes are detectable.
    fn returning(&self, builder: RequestBuilder) -> RequestBuilder {
        self.authorize(builder).header("Prefer", "return=representation")
    }

    async fn dispatch(request: Result<Request, gloo_net::Error>) -> Result<Response, GatewayError> {
        let request = request.map_err(|err| GatewayError::unavailable(err.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::unavailable(err.to_string()))?;
        if response.ok() {
            return Ok(response);
        }

        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| response.status_text());
        log::warn!("gateway answered {status}: {message}");
        Err(if status >= 500 {
            GatewayError::unavailable(format!("status {status}: {message}"))
        } else {
            GatewayError::Rejected { status, message }
        })
    }

    async fn rows<T: DeserializeOwned>(
        request: Result<Request, gloo_net::Error>,
    ) -> Result<Vec<T>, GatewayError> {
        let response = Self::dispatch(request).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|err| GatewayError::decode(err.to_string()))
    }

    fn eq_filter(value: &impl AsRef<str>) -> String {
        format!("eq.{}", value.as_ref())
    }
}

#[async_trait(?Send)]
impl DataGateway for RestGateway {
    async fn list_profiles(&self) -> Result<Vec<Profile>, GatewayError> {
        let url = self.url(
            USERS,
            &[("select", "*".to_owned()), ("order", "name.asc".to_owned())],
        );
        let rows: Vec<UserRow> = Self::rows(self.authorize(Request::get(&url)).build()).await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn get_profile(&self, id: &ProfileId) -> Result<Profile, GatewayError> {
        let url = self.url(USERS, &[("select", "*".to_owned()), ("id", Self::eq_filter(id))]);
        let rows: Vec<UserRow> = Self::rows(self.authorize(Request::get(&url)).build()).await?;
        rows.into_iter()
            .next()
            .map(Profile::from)
            .ok_or(GatewayError::NotFound { entity: "profile" })
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, GatewayError> {
        let url = self.url(
            TRANSACTIONS,
            &[
                ("select", TRANSACTION_SELECT.to_owned()),
                ("order", "created_at.desc".to_owned()),
            ],
        );
        let rows: Vec<TransactionRow> =
            Self::rows(self.authorize(Request::get(&url)).build()).await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn insert_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, GatewayError> {
        let url = self.url(TRANSACTIONS, &[("select", TRANSACTION_SELECT.to_owned())]);
        let body = TransactionInsert {
            user_id: transaction.owner_id.as_str(),
            kind: transaction.kind,
            amount: transaction.amount.get(),
            note: transaction.note.as_deref(),
        };
        let request = self.returning(Request::post(&url)).json(&body);
        let rows: Vec<TransactionRow> = Self::rows(request).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::decode("insert returned no row"))?;
        Transaction::try_from(row)
    }

    async fn update_transaction(
        &self,
        id: &TransactionId,
        owner_id: &ProfileId,
        patch: &TransactionPatch,
    ) -> Result<(), GatewayError> {
        let url = self.url(
            TRANSACTIONS,
            &[("id", Self::eq_filter(id)), ("user_id", Self::eq_filter(owner_id))],
        );
        let request = self
            .returning(Request::patch(&url))
            .json(&TransactionUpdate::from(patch));
        let rows: Vec<serde_json::Value> = Self::rows(request).await?;
        if rows.is_empty() {
            return Err(GatewayError::NoMatchingRow);
        }
        Ok(())
    }

    async fn delete_transaction(
        &self,
        id: &TransactionId,
        owner_id: &ProfileId,
    ) -> Result<(), GatewayError> {
        let url = self.url(
            TRANSACTIONS,
            &[("id", Self::eq_filter(id)), ("user_id", Self::eq_filter(owner_id))],
        );
        let rows: Vec<serde_json::Value> =
            Self::rows(self.returning(Request::delete(&url)).build()).await?;
        if rows.is_empty() {
            return Err(GatewayError::NoMatchingRow);
        }
        Ok(())
    }

    async fn get_active_target(&self) -> Result<Target, GatewayError> {
        let url = self.url(
            TARGETS,
            &[
                ("select", "*".to_owned()),
                ("order", "updated_at.asc,id.asc".to_owned()),
                ("limit", "1".to_owned()),
            ],
        );
        let rows: Vec<TargetRow> = Self::rows(self.authorize(Request::get(&url)).build()).await?;
        rows.into_iter()
            .next()
            .map(Target::from)
            .ok_or(GatewayError::NotFound { entity: "target" })
    }

    async fn insert_target(&self, target: &NewTarget) -> Result<Target, GatewayError> {
        let url = self.url(TARGETS, &[]);
        let body = TargetInsert {
            user_id: target.owner_id.as_str(),
            target_amount: target.target_amount,
            target_months: target.target_months,
            start_date: target.start_date,
        };
        let rows: Vec<TargetRow> =
            Self::rows(self.returning(Request::post(&url)).json(&body)).await?;
        rows.into_iter()
            .next()
            .map(Target::from)
            .ok_or_else(|| GatewayError::decode("insert returned no row"))
    }

    async fn update_target(
        &self,
        id: &TargetId,
        patch: &TargetPatch,
    ) -> Result<(), GatewayError> {
        let url = self.url(TARGETS, &[("id", Self::eq_filter(id))]);
        let body = TargetUpdate {
            target_amount: patch.target_amount,
            target_months: patch.target_months,
            start_date: patch.start_date,
            updated_at: patch.updated_at,
        };
        let rows: Vec<serde_json::Value> =
            Self::rows(self.returning(Request::patch(&url)).json(&body)).await?;
        if rows.is_empty() {
            return Err(GatewayError::NotFound { entity: "target" });
        }
        Ok(())
    }
}
