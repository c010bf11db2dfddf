//! Control-panel actions and their mapping onto obs-websocket requests.

use serde_json::Value;

use crate::errors::ActionError;

/// Action request as it arrives over HTTP.
///
/// Fields keep whatever JSON they were sent with; types are only checked in
/// [`Action::parse`], after the caller has decided the request can run at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionBody {
    pub action: Option<Value>,
    pub scene_name: Option<Value>,
    pub input_name: Option<Value>,
}

impl ActionBody {
    /// Action name, if it was sent as a string.
    pub fn action_name(&self) -> Option<&str> {
        self.action.as_ref().and_then(Value::as_str)
    }
}

impl From<Value> for ActionBody {
    /// Anything other than an object carries no fields.
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let mut take = |key: &str| map.remove(key).filter(|v| !v.is_null());
        Self {
            action: take("action"),
            scene_name: take("sceneName"),
            input_name: take("inputName"),
        }
    }
}

/// A validated action, one variant per recognized action name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SetScene { scene_name: String },
    StartStream,
    StopStream,
    StartRecording,
    StopRecording,
    Mute { input_name: String },
    Unmute { input_name: String },
}

/// One upstream RPC invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamRequest {
    SetCurrentProgramScene { scene_name: String },
    StartStream,
    StopStream,
    StartRecord,
    StopRecord,
    SetInputMute { input_name: String, muted: bool },
}

impl UpstreamRequest {
    /// obs-websocket request type name.
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::SetCurrentProgramScene { .. } => "SetCurrentProgramScene",
            Self::StartStream => "StartStream",
            Self::StopStream => "StopStream",
            Self::StartRecord => "StartRecord",
            Self::StopRecord => "StopRecord",
            Self::SetInputMute { .. } => "SetInputMute",
        }
    }
}

impl Action {
    /// Validate a wire body into an action.
    pub fn parse(body: &ActionBody) -> Result<Self, ActionError> {
        match body.action_name() {
            Some("scene") => Ok(Self::SetScene {
                scene_name: required(&body.scene_name, "sceneName")?,
            }),
            Some("start_stream") => Ok(Self::StartStream),
            Some("stop_stream") => Ok(Self::StopStream),
            Some("start_recording") => Ok(Self::StartRecording),
            Some("stop_recording") => Ok(Self::StopRecording),
            Some("mute") => Ok(Self::Mute {
                input_name: required(&body.input_name, "inputName")?,
            }),
            Some("unmute") => Ok(Self::Unmute {
                input_name: required(&body.input_name, "inputName")?,
            }),
            _ => Err(ActionError::UnknownAction),
        }
    }

    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetScene { .. } => "scene",
            Self::StartStream => "start_stream",
            Self::StopStream => "stop_stream",
            Self::StartRecording => "start_recording",
            Self::StopRecording => "stop_recording",
            Self::Mute { .. } => "mute",
            Self::Unmute { .. } => "unmute",
        }
    }

    /// The upstream request this action maps to.
    pub fn upstream_request(&self) -> UpstreamRequest {
        match self {
            Self::SetScene { scene_name } => UpstreamRequest::SetCurrentProgramScene {
                scene_name: scene_name.clone(),
            },
            Self::StartStream => UpstreamRequest::StartStream,
            Self::StopStream => UpstreamRequest::StopStream,
            Self::StartRecording => UpstreamRequest::StartRecord,
            Self::StopRecording => UpstreamRequest::StopRecord,
            Self::Mute { input_name } => UpstreamRequest::SetInputMute {
                input_name: input_name.clone(),
                muted: true,
            },
            Self::Unmute { input_name } => UpstreamRequest::SetInputMute {
                input_name: input_name.clone(),
                muted: false,
            },
        }
    }

    /// Human-readable confirmation returned to the caller.
    pub fn success_message(&self) -> String {
        match self {
            Self::SetScene { scene_name } => format!("Scene set to {scene_name}"),
            Self::StartStream => "Stream started".into(),
            Self::StopStream => "Stream stopped".into(),
            Self::StartRecording => "Recording started".into(),
            Self::StopRecording => "Recording stopped".into(),
            Self::Mute { input_name } => format!("Muted {input_name}"),
            Self::Unmute { input_name } => format!("Unmuted {input_name}"),
        }
    }
}

/// Non-empty string or `MissingField`.
fn required(value: &Option<Value>, field: &'static str) -> Result<String, ActionError> {
    value
        .as_ref()
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ActionError::MissingField(field))
}
