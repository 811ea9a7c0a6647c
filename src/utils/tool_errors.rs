use crate::errors::McpError;
use crate::utils::suggest::suggest;

pub fn unknown_tool_error(tool: &str, known_tools: &[&str]) -> McpError {
    let suggestions = suggest(tool, known_tools, 3);
    let mut message = format!("Unknown tool: {}", tool);
    if !suggestions.is_empty() {
        message.push_str(&format!(". Did you mean: {}?", suggestions.join(", ")));
    }
    message.push_str(&format!(" Available tools: {}.", known_tools.join(", ")));
    McpError::invalid_params(message).with_data(serde_json::json!({
        "tool": tool,
        "suggestions": suggestions,
        "available_tools": known_tools,
    }))
}
