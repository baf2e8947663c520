//! 工具目录:工具定义、端点映射与按工具的载荷构建/完成策略描述表。
//!
//! Static tool catalog.
//!
//! One row per tool: the declared argument schema (served verbatim through
//! `tools/list`), the payload builder, and the completion strategy. Endpoint
//! paths live in a separate map keyed by tool name so a missing mapping is a
//! distinct configuration failure rather than an unknown tool.
//!
//! Payload builders do tool-specific field renaming, defaulting, and
//! required-field checks. Arguments the backend expects as JSON strings are
//! serialized when passed as structured values and passed through unchanged
//! when already strings.

use crate::poller::PollPolicy;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Argument mapping of one tool invocation.
pub type ToolArgs = Map<String, Value>;

/// Shared status endpoint polled by every asynchronous tool.
pub const QUERY_TASK_ENDPOINT: &str = "/pulsar/mcp/inner/comic/query_task";

/// Which polling budget a task-strategy tool uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// 30 attempts, 2s apart.
    Standard,
    /// 20 attempts, 5s apart.
    Extended,
}

impl PollKind {
    pub fn default_policy(self) -> PollPolicy {
        match self {
            PollKind::Standard => PollPolicy::STANDARD,
            PollKind::Extended => PollPolicy::EXTENDED,
        }
    }
}

/// How a tool's backend call is driven to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The endpoint emits content incrementally; aggregate the event stream.
    /// These tools never poll.
    Stream,
    /// Call once; if the immediate response carries a task handle instead of
    /// the result, poll the status endpoint with the given budget.
    Task { poll: PollKind },
}

/// One catalog row: definition plus dispatch descriptor.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema for the tool's arguments, served through `tools/list`.
    pub input_schema: Value,
    pub strategy: Strategy,
    pub build_payload: fn(&ToolArgs) -> Result<Value>,
}

/// Look up a catalog row by tool name.
pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|tool| tool.name == name)
}

/// Backend path for a tool, if mapped.
pub fn endpoint(name: &str) -> Option<&'static str> {
    ENDPOINT_MAP.get(name).copied()
}

/// Tool name → backend path.
pub static ENDPOINT_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "gbu_generate_comic_story",
            "/pulsar/mcp/inner/comic/generate_script",
        ),
        (
            "gbu_generate_comic_chapters",
            "/pulsar/mcp/inner/comic/generate_storyboards",
        ),
        (
            "gbu_generate_comic_image_prompts",
            "/pulsar/mcp/inner/comic/prompt_format",
        ),
        (
            "gbu_edit_comic_story",
            "/pulsar/mcp/inner/comic/edit_script",
        ),
        (
            "gbu_edit_comic_chapters",
            "/pulsar/mcp/inner/comic/edit_storyboards",
        ),
        ("gbu_ugc_tti", "/pulsar/mcp/inner/comic/generate_role"),
        (
            "gbu_anime_pose_align",
            "/pulsar/mcp/inner/comic/pose_straighten",
        ),
        (
            "gbu_anime_comic_image",
            "/pulsar/mcp/inner/comic/generate_comic",
        ),
        ("gbu_flux_edit_image", "/pulsar/mcp/inner/comic/edit"),
    ])
});

/// The full tool catalog. Immutable, loaded once.
pub static TOOLS: Lazy<Vec<ToolSpec>> = Lazy::new(|| {
    vec![
        ToolSpec {
            name: "gbu_generate_comic_story",
            description: "Generate a comic story based on input story theme",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "topic_input": { "type": "string", "description": "Story theme/topic" }
                },
                "required": ["topic_input"]
            }),
            strategy: Strategy::Stream,
            build_payload: story_payload,
        },
        ToolSpec {
            name: "gbu_generate_comic_chapters",
            description: "Generate comic story chapters",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "input_novel": { "type": "string", "description": "Novel input" },
                    "chars_info": { "type": "string", "description": "Characters info (JSON string)" },
                    "chapter_num": { "type": "number", "description": "Number of chapters", "default": 4 }
                },
                "required": ["input_novel", "chars_info"]
            }),
            strategy: Strategy::Stream,
            build_payload: chapters_payload,
        },
        ToolSpec {
            name: "gbu_generate_comic_image_prompts",
            description: "Generate image prompts for comic chapter",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "input_chapters": { "type": "string", "description": "Chapter JSON" },
                    "chars_info": { "type": "string", "description": "Characters info JSON" }
                },
                "required": ["input_chapters", "chars_info"]
            }),
            strategy: Strategy::Stream,
            build_payload: image_prompts_payload,
        },
        ToolSpec {
            name: "gbu_edit_comic_story",
            description: "Edit comic story",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "edit_prompt": { "type": "string" },
                    "input_story": { "type": "string", "description": "Story JSON" }
                },
                "required": ["edit_prompt", "input_story"]
            }),
            strategy: Strategy::Stream,
            build_payload: edit_story_payload,
        },
        ToolSpec {
            name: "gbu_edit_comic_chapters",
            description: "Edit comic chapters",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "edit_prompt": { "type": "string" },
                    "input_chapters": { "type": "string", "description": "Chapters JSON" }
                },
                "required": ["edit_prompt", "input_chapters"]
            }),
            strategy: Strategy::Stream,
            build_payload: edit_chapters_payload,
        },
        ToolSpec {
            name: "gbu_ugc_tti",
            description: "Generate an anime character based on text prompt",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" },
                    "gender": { "type": "number" },
                    "model_style": { "type": "string" }
                },
                "required": ["prompt", "gender", "model_style"]
            }),
            strategy: Strategy::Task {
                poll: PollKind::Standard,
            },
            build_payload: role_payload,
        },
        ToolSpec {
            name: "gbu_anime_pose_align",
            description: "Generate pose align image",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "image_url": { "type": "string" }
                },
                "required": ["image_url"]
            }),
            strategy: Strategy::Task {
                poll: PollKind::Standard,
            },
            build_payload: pose_align_payload,
        },
        ToolSpec {
            name: "gbu_anime_comic_image",
            description: "Generate comic image",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" },
                    "scene_type": { "type": "string" },
                    "char1_image": { "type": "string" },
                    "char2_image": { "type": "string" },
                    "char1_gender": { "type": "string" },
                    "char2_gender": { "type": "string" },
                    "model_style": { "type": "string" }
                },
                "required": ["prompt", "scene_type", "char1_image", "char1_gender", "model_style"]
            }),
            strategy: Strategy::Task {
                poll: PollKind::Standard,
            },
            build_payload: comic_image_payload,
        },
        ToolSpec {
            name: "gbu_flux_edit_image",
            description: "Edit image based on prompt",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "image_url": { "type": "string" },
                    "image_prompt": { "type": "string" }
                },
                "required": ["image_url", "image_prompt"]
            }),
            strategy: Strategy::Task {
                poll: PollKind::Extended,
            },
            build_payload: flux_edit_payload,
        },
    ]
});

/// Whether an argument counts as absent for required-field checks.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn require<'a>(args: &'a ToolArgs, key: &str) -> Result<&'a Value> {
    args.get(key)
        .filter(|value| !is_absent(value))
        .ok_or_else(|| Error::Validation(key.to_owned()))
}

/// Serialize a structured value to a JSON string; strings pass through
/// unchanged.
fn as_json_string(value: &Value) -> Result<Value> {
    match value {
        Value::String(_) => Ok(value.clone()),
        other => Ok(Value::String(serde_json::to_string(other)?)),
    }
}

fn story_payload(args: &ToolArgs) -> Result<Value> {
    // `theme` is accepted as a legacy alias for `topic_input`.
    let topic = args
        .get("topic_input")
        .filter(|v| !is_absent(v))
        .or_else(|| args.get("theme").filter(|v| !is_absent(v)))
        .ok_or_else(|| Error::Validation("topic_input".to_owned()))?;
    Ok(json!({ "topic_input": topic }))
}

fn chapters_payload(args: &ToolArgs) -> Result<Value> {
    let input_novel = require(args, "input_novel")?;
    let chars_info = as_json_string(require(args, "chars_info")?)?;
    // `chapters_num` is accepted as a legacy alias for `chapter_num`.
    let chapter_num = args
        .get("chapter_num")
        .or_else(|| args.get("chapters_num"))
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| json!(4));
    Ok(json!({
        "input_novel": input_novel,
        "chars_info": chars_info,
        "chapter_num": chapter_num,
    }))
}

fn image_prompts_payload(args: &ToolArgs) -> Result<Value> {
    let input_chapter = as_json_string(require(args, "input_chapters")?)?;
    let chars_info = as_json_string(require(args, "chars_info")?)?;
    // The backend field is singular.
    Ok(json!({
        "input_chapter": input_chapter,
        "chars_info": chars_info,
    }))
}

fn edit_story_payload(args: &ToolArgs) -> Result<Value> {
    let edit_prompt = require(args, "edit_prompt")?;
    let input_story = as_json_string(require(args, "input_story")?)?;
    Ok(json!({
        "edit_prompt": edit_prompt,
        "input_story": input_story,
    }))
}

fn edit_chapters_payload(args: &ToolArgs) -> Result<Value> {
    let edit_prompt = require(args, "edit_prompt")?;
    let input_chapters = as_json_string(require(args, "input_chapters")?)?;
    Ok(json!({
        "edit_prompt": edit_prompt,
        "input_chapters": input_chapters,
    }))
}

fn role_payload(args: &ToolArgs) -> Result<Value> {
    require(args, "prompt")?;
    require(args, "gender")?;
    require(args, "model_style")?;
    Ok(Value::Object(args.clone()))
}

fn pose_align_payload(args: &ToolArgs) -> Result<Value> {
    require(args, "image_url")?;
    Ok(Value::Object(args.clone()))
}

fn comic_image_payload(args: &ToolArgs) -> Result<Value> {
    require(args, "prompt")?;
    require(args, "scene_type")?;
    require(args, "char1_image")?;
    require(args, "char1_gender")?;
    require(args, "model_style")?;
    Ok(Value::Object(args.clone()))
}

fn flux_edit_payload(args: &ToolArgs) -> Result<Value> {
    let image_url = require(args, "image_url")?;
    let image_prompt = require(args, "image_prompt")?;
    // The backend names the prompt field `edit_prompt`.
    Ok(json!({
        "image_url": image_url,
        "edit_prompt": image_prompt,
    }))
}
