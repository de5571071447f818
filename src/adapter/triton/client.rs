use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::tensor::BytesTensor;
use crate::config::Settings;
use crate::error::SummarizerError;
use crate::port::{BatchInference, PortFuture};

pub const INPUT_NAME: &str = "input_text";
pub const OUTPUT_NAME: &str = "output_text";
/// Length of the JSON header that precedes binary tensor data.
pub const HEADER_LENGTH: &str = "inference-header-content-length";

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct InferRequest<'a> {
    inputs: [InputTensor<'a>; 1],
    outputs: [RequestedOutput<'a>; 1],
}

#[derive(Serialize)]
struct InputTensor<'a> {
    name: &'a str,
    shape: [usize; 2],
    datatype: &'a str,
    parameters: BinaryParameters,
}

#[derive(Serialize)]
struct RequestedOutput<'a> {
    name: &'a str,
    parameters: OutputParameters,
}

#[derive(Serialize)]
struct OutputParameters {
    binary_data: bool,
}

#[derive(Serialize, Deserialize, Default)]
struct BinaryParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_data_size: Option<usize>,
}

#[derive(Deserialize)]
struct InferResponse {
    #[serde(default)]
    outputs: Vec<OutputTensor>,
}

#[derive(Deserialize)]
struct OutputTensor {
    name: String,
    #[serde(default)]
    parameters: BinaryParameters,
    #[serde(default)]
    data: Option<Vec<Value>>,
}

/// HTTP client for a Triton model serving the summarization model.
///
/// Built once at startup and shared by reference; every batch is exactly one
/// `POST /v2/models/{model}/infer`.
#[derive(Debug, Clone)]
pub struct TritonClient {
    client: Client,
    base_url: Url,
    model_name: String,
    inference_timeout: Duration,
}

impl TritonClient {
    pub fn new(
        base_url: &str,
        model_name: impl Into<String>,
        inference_timeout: Duration,
    ) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .build()
            .map_err(|e| SummarizerError::Config(format!("failed to build Triton client: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            model_name: model_name.into(),
            inference_timeout,
        })
    }

    /// Build the client from settings and, when configured, refuse to start
    /// until the model reports ready.
    pub async fn connect(settings: &Settings) -> Result<Self, SummarizerError> {
        let client = Self::new(
            &settings.triton_server_url,
            settings.triton_model_name.clone(),
            settings.inference_timeout,
        )?;
        if settings.inference_ensure_ready {
            client.model_ready().await?;
        }
        info!(
            url = %client.base_url,
            model = %client.model_name,
            "Triton client is connected to server"
        );
        Ok(client)
    }

    fn endpoint(&self, path: &str) -> Result<Url, SummarizerError> {
        self.base_url
            .join(path)
            .map_err(|e| SummarizerError::Config(format!("failed to build Triton URL {path}: {e}")))
    }

    async fn probe(&self, path: &str) -> Result<(), SummarizerError> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| SummarizerError::Inference(format!("{path} request failed: {e}")))?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(SummarizerError::Inference(format!(
                "{path} returned status {}",
                response.status()
            )))
        }
    }

    pub async fn health_check(&self) -> Result<(), SummarizerError> {
        self.probe("v2/health/live").await?;
        self.probe("v2/health/ready").await
    }

    pub async fn model_ready(&self) -> Result<(), SummarizerError> {
        self.probe(&format!("v2/models/{}/ready", self.model_name))
            .await
    }

    /// One round trip for the whole batch. All-or-nothing.
    #[instrument(skip_all, fields(model = %self.model_name, batch = texts.len()))]
    pub async fn infer_batch(&self, texts: &[String]) -> Result<Vec<String>, SummarizerError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let tensor = BytesTensor::from_texts(texts);
        let payload = tensor.encode().map_err(|e| {
            SummarizerError::Inference(format!("failed to encode input tensor: {e}"))
        })?;
        let header = serde_json::to_vec(&InferRequest {
            inputs: [InputTensor {
                name: INPUT_NAME,
                shape: tensor.shape(),
                datatype: "BYTES",
                parameters: BinaryParameters {
                    binary_data_size: Some(payload.len()),
                },
            }],
            outputs: [RequestedOutput {
                name: OUTPUT_NAME,
                parameters: OutputParameters { binary_data: true },
            }],
        })
        .map_err(|e| SummarizerError::Inference(format!("failed to encode request header: {e}")))?;

        let mut body = BytesMut::with_capacity(header.len() + payload.len());
        body.put_slice(&header);
        body.put_slice(&payload);

        let url = self.endpoint(&format!("v2/models/{}/infer", self.model_name))?;
        debug!(%url, header_len = header.len(), "sending inference request");

        let response = self
            .client
            .post(url)
            .header(HEADER_LENGTH, header.len().to_string())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body.freeze())
            .timeout(self.inference_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Inference(format!(
                "inference endpoint returned status {status}: {}",
                truncate(&body, MAX_ERROR_BODY)
            )));
        }

        let header_len = response
            .headers()
            .get(HEADER_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        let raw = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let outputs = decode_response(raw, header_len)?;
        if outputs.len() != texts.len() {
            return Err(SummarizerError::Inference(format!(
                "expected {} outputs, server returned {}",
                texts.len(),
                outputs.len()
            )));
        }
        Ok(outputs)
    }

    fn transport_error(&self, e: &reqwest::Error) -> SummarizerError {
        if e.is_timeout() {
            SummarizerError::Inference(format!(
                "inference timed out after {}s",
                self.inference_timeout.as_secs()
            ))
        } else {
            SummarizerError::Inference(format!("inference request failed: {e}"))
        }
    }
}

impl BatchInference for TritonClient {
    fn infer_batch(&self, texts: Vec<String>) -> PortFuture<'_, Vec<String>> {
        Box::pin(async move { TritonClient::infer_batch(self, &texts).await })
    }

    fn health_check(&self) -> PortFuture<'_, ()> {
        Box::pin(self.health_check())
    }
}

/// Accept `host:port` and `http(s)://host:port[/prefix]`. A `grpc://` scheme
/// is stripped and the address is used over HTTP.
fn normalize_base_url(raw: &str) -> Result<Url, SummarizerError> {
    let raw = raw.trim();
    let raw = match raw.strip_prefix("grpc://") {
        Some(address) => {
            warn!(
                configured = raw,
                "TRITON_SERVER_URL uses grpc://, talking HTTP to {address} instead"
            );
            address
        }
        None => raw,
    };
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let with_slash = if with_scheme.ends_with('/') {
        with_scheme
    } else {
        format!("{with_scheme}/")
    };
    Url::parse(&with_slash)
        .map_err(|e| SummarizerError::Config(format!("invalid TRITON_SERVER_URL {raw}: {e}")))
}

/// Extract the generated texts from an infer response, either from the
/// binary section (when `header_len` is present) or from JSON `data`.
fn decode_response(raw: Bytes, header_len: Option<usize>) -> Result<Vec<String>, SummarizerError> {
    let header_len = header_len.unwrap_or(raw.len());
    if header_len > raw.len() {
        return Err(SummarizerError::Inference(format!(
            "response header length {header_len} exceeds body length {}",
            raw.len()
        )));
    }
    let header: InferResponse = serde_json::from_slice(&raw[..header_len])
        .map_err(|e| SummarizerError::Inference(format!("malformed inference response: {e}")))?;

    // Binary sections follow the header in output order.
    let mut offset = header_len;
    for output in header.outputs {
        let binary_len = output.parameters.binary_data_size;
        if output.name != OUTPUT_NAME {
            offset = advance(offset, binary_len.unwrap_or(0), &output.name)?;
            continue;
        }
        return match (binary_len, output.data) {
            (Some(len), _) => {
                let end = advance(offset, len, OUTPUT_NAME)?;
                if end > raw.len() {
                    return Err(SummarizerError::Inference(format!(
                        "binary output needs {end} bytes, response has {}",
                        raw.len()
                    )));
                }
                BytesTensor::decode(raw.slice(offset..end))
                    .and_then(BytesTensor::into_texts)
                    .map_err(|e| SummarizerError::Inference(format!("invalid output tensor: {e}")))
            }
            (None, Some(data)) => data
                .into_iter()
                .map(|value| match value {
                    Value::String(text) => Ok(text),
                    other => Err(SummarizerError::Inference(format!(
                        "expected string output element, got {other}"
                    ))),
                })
                .collect(),
            (None, None) => Err(SummarizerError::Inference(
                "output tensor carries no data".into(),
            )),
        };
    }
    Err(SummarizerError::Inference(format!(
        "response has no `{OUTPUT_NAME}` output"
    )))
}

/// End of a binary section of `len` bytes starting at `offset`.
fn advance(offset: usize, len: usize, name: &str) -> Result<usize, SummarizerError> {
    offset.checked_add(len).ok_or_else(|| {
        SummarizerError::Inference(format!(
            "binary_data_size {len} of output `{name}` overflows the response"
        ))
    })
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated {} bytes)", &body[..end], body.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    /// Parse a binary infer request the way Triton would.
    fn request_texts(request: &Request) -> Vec<String> {
        let header_len: usize = request
            .headers
            .get(HEADER_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .expect("header length");
        let body = Bytes::copy_from_slice(&request.body);
        BytesTensor::decode(body.slice(header_len..))
            .unwrap()
            .into_texts()
            .unwrap()
    }

    fn binary_response(texts: &[String]) -> ResponseTemplate {
        let payload = BytesTensor::from_texts(texts).encode().unwrap();
        let header = serde_json::to_vec(&json!({
            "model_name": "summarization_model",
            "outputs": [{
                "name": OUTPUT_NAME,
                "datatype": "BYTES",
                "shape": [texts.len(), 1],
                "parameters": {"binary_data_size": payload.len()}
            }]
        }))
        .unwrap();
        let mut body = header.clone();
        body.extend_from_slice(&payload);
        ResponseTemplate::new(200)
            .insert_header(HEADER_LENGTH, header.len().to_string().as_str())
            .set_body_bytes(body)
    }

    fn client_for(server: &MockServer) -> TritonClient {
        TritonClient::new(&server.uri(), "summarization_model", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_infer_batch_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/models/summarization_model/infer"))
            .and(header("content-type", "application/octet-stream"))
            .respond_with(|request: &Request| {
                let outputs: Vec<String> = request_texts(request)
                    .iter()
                    .map(|t| format!("summary<{t}>"))
                    .collect();
                binary_response(&outputs)
            })
            .expect(1)
            .mount(&server)
            .await;

        let inputs = vec![
            "Summarize: Test Article 1\nbody".to_string(),
            "Summarize: Test Article 2\nbody ü".to_string(),
        ];
        let outputs = client_for(&server).infer_batch(&inputs).await.unwrap();

        assert_eq!(
            outputs,
            vec![
                "summary<Summarize: Test Article 1\nbody>".to_string(),
                "summary<Summarize: Test Article 2\nbody ü>".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_infer_batch_accepts_json_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/models/summarization_model/infer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "outputs": [{
                    "name": OUTPUT_NAME,
                    "datatype": "BYTES",
                    "shape": [1, 1],
                    "data": ["a short summary"]
                }]
            })))
            .mount(&server)
            .await;

        let outputs = client_for(&server)
            .infer_batch(&["Summarize: t\nc".to_string()])
            .await
            .unwrap();
        assert_eq!(outputs, vec!["a short summary".to_string()]);
    }

    #[tokio::test]
    async fn test_cardinality_mismatch_fails_whole_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/models/summarization_model/infer"))
            .respond_with(binary_response(&["only one".to_string()]))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .infer_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizerError::Inference(_)));
        assert!(err.to_string().contains("expected 2 outputs"));
    }

    #[tokio::test]
    async fn test_server_error_truncates_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/models/summarization_model/infer"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(10_000)))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .infer_batch(&["a".to_string()])
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("truncated"));
        assert!(message.len() < 1000);
    }

    #[tokio::test]
    async fn test_timeout_is_inference_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/models/summarization_model/infer"))
            .respond_with(
                binary_response(&["late".to_string()]).set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            TritonClient::new(&server.uri(), "summarization_model", Duration::from_millis(50))
                .unwrap();
        let err = client.infer_batch(&["a".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let outputs = client_for(&server).infer_batch(&[]).await.unwrap();
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_health_check_requires_live_and_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/health/live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/health/ready"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = client_for(&server).health_check().await.unwrap_err();
        assert!(err.to_string().contains("v2/health/ready"));
    }

    #[tokio::test]
    async fn test_model_ready_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/models/summarization_model/ready"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        client_for(&server).model_ready().await.unwrap();
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("127.0.0.1:8000").unwrap().as_str(),
            "http://127.0.0.1:8000/"
        );
        assert_eq!(
            normalize_base_url("http://triton:8000/prefix").unwrap().as_str(),
            "http://triton:8000/prefix/"
        );
        assert_eq!(
            normalize_base_url("grpc://127.0.0.1:8001").unwrap().as_str(),
            "http://127.0.0.1:8001/"
        );
    }

    #[test]
    fn test_decode_response_rejects_missing_output() {
        let raw = Bytes::from(serde_json::to_vec(&json!({"outputs": []})).unwrap());
        let err = decode_response(raw, None).unwrap_err();
        assert!(err.to_string().contains("output_text"));
    }

    #[test]
    fn test_decode_response_rejects_overflowing_binary_size() {
        let header = serde_json::to_vec(&json!({
            "outputs": [
                {"name": "other", "parameters": {"binary_data_size": 1}},
                {"name": OUTPUT_NAME, "parameters": {"binary_data_size": u64::MAX}}
            ]
        }))
        .unwrap();
        let header_len = header.len();
        let mut body = header;
        body.push(0);

        let err = decode_response(Bytes::from(body), Some(header_len)).unwrap_err();

        assert!(matches!(err, SummarizerError::Inference(_)));
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_decode_response_rejects_overflow_in_skipped_output() {
        let header = serde_json::to_vec(&json!({
            "outputs": [
                {"name": "other", "parameters": {"binary_data_size": u64::MAX}},
                {"name": OUTPUT_NAME, "data": ["x"]}
            ]
        }))
        .unwrap();
        let header_len = header.len();

        let err = decode_response(Bytes::from(header), Some(header_len)).unwrap_err();
        assert!(err.to_string().contains("`other`"));
    }
}
