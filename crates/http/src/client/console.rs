//! Console business endpoints
//!
//! Every call here goes through the auth layer.

use super::{ApiClient, ClientError};
use crate::types::{
    ChurnPrediction, Client, EmailRequest, SentimentAnalysis, SentimentRequest, SmsRequest,
};
use reqwest::Method;
use serde_json::Value as JsonValue;

impl ApiClient {
    /// List tracked clients
    pub async fn list_clients(&self) -> Result<Vec<Client>, ClientError> {
        let request = self.request(Method::GET, "/clients");
        self.execute(request).await
    }

    /// Get a single client
    pub async fn get_client(&self, id: u64) -> Result<Client, ClientError> {
        let request = self.request(Method::GET, &format!("/clients/{id}"));
        self.execute(request).await
    }

    /// Get the churn prediction for a client
    pub async fn churn_prediction(&self, client_id: u64) -> Result<ChurnPrediction, ClientError> {
        let request = self.request(Method::GET, &format!("/predictions/{client_id}"));
        self.execute(request).await
    }

    /// Run sentiment analysis over a piece of client feedback
    pub async fn analyze_sentiment(
        &self,
        client_id: u64,
        text: &str,
    ) -> Result<SentimentAnalysis, ClientError> {
        let request = self
            .request(Method::POST, "/analyze")
            .json(&SentimentRequest { client_id, text });
        self.execute(request).await
    }

    /// Send an outreach email
    pub async fn send_email(
        &self,
        client_id: u64,
        subject: &str,
        content: &str,
    ) -> Result<JsonValue, ClientError> {
        let request = self.request(Method::POST, "/email").json(&EmailRequest {
            client_id,
            subject,
            content,
        });
        self.execute(request).await
    }

    /// Send an outreach SMS
    pub async fn send_sms(&self, client_id: u64, message: &str) -> Result<JsonValue, ClientError> {
        let request = self
            .request(Method::POST, "/sms")
            .json(&SmsRequest { client_id, message });
        self.execute(request).await
    }
}
