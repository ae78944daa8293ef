//! Line-delimited JSON plugin protocol
//!
//! The first line written is a handshake:
//!
//! ```text
//! {"protocol_version":1,"provider":"netbox"}
//! ```
//!
//! After that each request line produces exactly one response line. Logging
//! must never go to stdout while serving.

use crate::diagnostics::Diagnostics;
use crate::error::SdkError;
use crate::provider::{Outcome, Provider, ProviderSchema};
use crate::validation::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Sent in the handshake line
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum Call {
    GetSchema {},
    ConfigureProvider {
        #[serde(default)]
        config: Config,
    },
    ValidateResourceConfig {
        type_name: String,
        #[serde(default)]
        config: Config,
    },
    ValidateDataSourceConfig {
        type_name: String,
        #[serde(default)]
        config: Config,
    },
    CreateResource {
        type_name: String,
        #[serde(default)]
        config: Config,
    },
    ReadResource {
        type_name: String,
        state: Value,
    },
    UpdateResource {
        type_name: String,
        prior_state: Value,
        #[serde(default)]
        config: Config,
    },
    DeleteResource {
        type_name: String,
        state: Value,
    },
    ImportResource {
        type_name: String,
        id: String,
    },
    ReadDataSource {
        type_name: String,
        #[serde(default)]
        config: Config,
    },
    Stop {},
}

#[derive(Debug, Serialize)]
struct Handshake<'a> {
    protocol_version: u32,
    provider: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<ProviderSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<Value>,
    diagnostics: Diagnostics,
}

impl Reply {
    fn diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Default::default()
        }
    }

    fn outcome(outcome: Outcome) -> Self {
        Self {
            state: Some(outcome.state),
            diagnostics: outcome.diagnostics,
            ..Default::default()
        }
    }

    fn invalid(err: impl std::fmt::Display) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(format!("invalid request: {}", err));
        Self::diagnostics(diagnostics)
    }
}

/// Split a request line into its correlation id and call
fn parse_line(line: &str) -> (Option<Value>, Result<Call, serde_json::Error>) {
    let mut value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return (None, Err(e)),
    };
    let request_id = value.as_object_mut().and_then(|obj| obj.remove("request_id"));
    (request_id, serde_json::from_value(value))
}

async fn dispatch<M>(provider: &Provider<M>, call: Call) -> Reply
where
    M: ?Sized + Send + Sync + 'static,
{
    match call {
        Call::GetSchema {} => Reply {
            schema: Some(provider.schema()),
            ..Default::default()
        },
        Call::ConfigureProvider { config } => Reply::diagnostics(provider.configure(config).await),
        Call::ValidateResourceConfig { type_name, config } => {
            Reply::diagnostics(provider.validate_resource_config(&type_name, &config))
        }
        Call::ValidateDataSourceConfig { type_name, config } => {
            Reply::diagnostics(provider.validate_data_source_config(&type_name, &config))
        }
        Call::CreateResource { type_name, config } => {
            Reply::outcome(provider.create(&type_name, config).await)
        }
        Call::ReadResource { type_name, state } => {
            Reply::outcome(provider.read(&type_name, &state).await)
        }
        Call::UpdateResource {
            type_name,
            prior_state,
            config,
        } => Reply::outcome(provider.update(&type_name, &prior_state, config).await),
        Call::DeleteResource { type_name, state } => {
            Reply::outcome(provider.delete(&type_name, &state).await)
        }
        Call::ImportResource { type_name, id } => {
            Reply::outcome(provider.import(&type_name, &id).await)
        }
        Call::ReadDataSource { type_name, config } => {
            Reply::outcome(provider.read_data_source(&type_name, config).await)
        }
        Call::Stop {} => Reply::default(),
    }
}

async fn write_line<W, T>(writer: &mut W, value: &T) -> Result<(), SdkError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Serve requests from `reader` until `stop` or end of input
pub async fn serve<M, R, W>(provider: &Provider<M>, reader: R, mut writer: W) -> Result<(), SdkError>
where
    M: ?Sized + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_line(
        &mut writer,
        &Handshake {
            protocol_version: PROTOCOL_VERSION,
            provider: provider.name(),
        },
    )
    .await?;
    info!("Serving provider {} (protocol v{})", provider.name(), PROTOCOL_VERSION);

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (request_id, call) = parse_line(&line);
        let (mut reply, stop) = match call {
            Ok(call) => {
                debug!(request_id = ?request_id, "Handling request");
                let stop = matches!(call, Call::Stop {});
                (dispatch(provider, call).await, stop)
            }
            Err(e) => {
                warn!("Rejected request line: {}", e);
                (Reply::invalid(e), false)
            }
        };
        reply.request_id = request_id;
        write_line(&mut writer, &reply).await?;

        if stop {
            info!("Stop requested");
            break;
        }
    }
    Ok(())
}

/// Serve over the process's stdin and stdout
pub async fn serve_stdio<M>(provider: &Provider<M>) -> Result<(), SdkError>
where
    M: ?Sized + Send + Sync + 'static,
{
    serve(provider, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ResourceData;
    use crate::provider::{Configure, DataSource};
    use crate::schema::{ResourceSchema, Schema};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Unit;

    #[async_trait]
    impl Configure<()> for Unit {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new([("greeting", Schema::string().optional().default_value("hello"))])
        }

        async fn configure(&self, _d: &ResourceData, _diags: &mut Diagnostics) -> anyhow::Result<Arc<()>> {
            Ok(Arc::new(()))
        }
    }

    struct Echo;

    #[async_trait]
    impl DataSource<()> for Echo {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new([
                ("input", Schema::string().required()),
                ("output", Schema::string().computed()),
            ])
        }

        async fn read(&self, d: &mut ResourceData, _meta: &()) -> anyhow::Result<()> {
            let input = d.get_string("input");
            d.set("output", input.to_uppercase())?;
            d.set_id(input);
            Ok(())
        }
    }

    async fn run(input: &str) -> Vec<Value> {
        let provider = Provider::new("echo", Unit).data_source("echo_text", Echo);
        let mut out = Vec::new();
        serve(&provider, input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn handshake_then_replies_in_order() {
        let replies = run(concat!(
            r#"{"method":"configure_provider","request_id":1,"config":{}}"#,
            "\n",
            r#"{"method":"read_data_source","request_id":"b","type_name":"echo_text","config":{"input":"hi"}}"#,
            "\n",
        ))
        .await;

        assert_eq!(replies[0], serde_json::json!({"protocol_version": 1, "provider": "echo"}));
        assert_eq!(replies[1]["request_id"], 1);
        assert_eq!(replies[1]["diagnostics"], serde_json::json!([]));
        assert_eq!(replies[2]["request_id"], "b");
        assert_eq!(replies[2]["state"]["output"], "HI");
        assert_eq!(replies.len(), 3);
    }

    #[tokio::test]
    async fn malformed_lines_do_not_stop_the_loop() {
        let replies = run("not json\n{\"method\":\"dance\",\"request_id\":7}\n{\"method\":\"stop\"}\n{\"method\":\"get_schema\"}\n").await;

        assert_eq!(replies.len(), 4);
        let first = replies[1]["diagnostics"][0]["summary"].as_str().unwrap();
        assert!(first.starts_with("invalid request:"));
        assert_eq!(replies[2]["request_id"], 7);
        assert_eq!(replies[2]["diagnostics"][0]["severity"], "error");
        assert!(replies[3].get("state").is_none());
    }

    #[tokio::test]
    async fn get_schema_lists_types() {
        let replies = run("{\"method\":\"get_schema\"}\n").await;
        let schema = &replies[1]["schema"];
        assert!(schema["data_sources"]["echo_text"]["attributes"]["output"]["computed"]
            .as_bool()
            .unwrap());
        assert_eq!(schema["provider"]["attributes"]["greeting"]["default"], "hello");
    }
}
