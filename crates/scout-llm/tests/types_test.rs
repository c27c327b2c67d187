use scout_llm::{ChatOptions, ChatRequest, Message, Role, Tool, ToolCall};
use serde_json::{json, Map, Value};

#[test]
fn test_message_constructors() {
    let system = Message::system("You are helpful");
    assert_eq!(system.role, Role::System);
    assert_eq!(system.text(), "You are helpful");

    let tool = Message::tool_result("call_1", "SEARCH_RESULTS:\nnothing");
    assert_eq!(tool.role, Role::Tool);
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
}

#[test]
fn test_user_message_serializes_images_only_when_present() {
    let plain = serde_json::to_value(Message::user("hi")).unwrap();
    assert_eq!(plain, json!({"role": "user", "content": "hi"}));

    let with_images =
        serde_json::to_value(Message::user("look").with_images(vec!["aGVsbG8=".into()])).unwrap();
    assert_eq!(with_images["images"], json!(["aGVsbG8="]));
}

#[test]
fn test_tool_result_pair_keeps_linkage_after_reserialization() {
    let mut args = Map::new();
    args.insert("query".into(), Value::String("weather".into()));
    let call = ToolCall::new(Some("call_7".into()), "web_search", args);

    let history = vec![
        Message::user("what's the weather"),
        Message::assistant_with_tools(vec![call]),
        Message::tool_result("call_7", "SEARCH_RESULTS:\nsunny"),
    ];

    let raw = serde_json::to_string(&history).unwrap();
    let decoded: Vec<Message> = serde_json::from_str(&raw).unwrap();

    assert_eq!(decoded, history);
    let roles: Vec<Role> = decoded.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
    assert_eq!(
        decoded[1].tool_calls.as_ref().unwrap()[0].id,
        decoded[2].tool_call_id
    );
}

#[test]
fn test_tool_call_arguments_accept_json_string() {
    let call: ToolCall = serde_json::from_value(json!({
        "id": "abc",
        "type": "function",
        "function": {"name": "web_search", "arguments": "{\"query\":\"rust\"}"}
    }))
    .unwrap();

    assert_eq!(call.argument_str("query"), Some("rust"));
}

#[test]
fn test_tool_call_without_id_or_type() {
    let call: ToolCall = serde_json::from_value(json!({
        "function": {"name": "web_search", "arguments": {"query": "x"}}
    }))
    .unwrap();

    assert!(call.id.is_none());
    assert_eq!(call.tool_type, "function");
}

#[test]
fn test_blank_reasoning_is_dropped() {
    let msg = Message::assistant("done").with_reasoning("   ");
    assert!(msg.reasoning.is_none());

    let msg = Message::assistant("done").with_reasoning("thought");
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["reasoning_content"], "thought");
}

#[test]
fn test_request_reports_tools() {
    let tool = Tool::new("web_search", "Search", json!({"type": "object"}));
    let request = ChatRequest::new("llama3", vec![Message::user("hi")])
        .with_options(ChatOptions::new().tools(vec![tool]));
    assert!(request.has_tools());

    let bare = ChatRequest::new("llama3", vec![]);
    assert!(!bare.has_tools());
}
