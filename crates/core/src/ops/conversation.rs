use agency_model::{ModelMessage, ModelRequest, ToolCallResult};

use crate::model_client::{DeltaCallback, ModelClient};
use crate::tool::find_func;
use crate::{Error, FuncDef, Message};

/// Runs the function calling loop until the model answers without
/// requesting any function.
///
/// Every round sends the whole conversation, including the tool results
/// of the previous rounds. The first error aborts the loop.
pub(super) async fn run(
    client: &ModelClient,
    mut req: ModelRequest,
    func_defs: &[FuncDef],
    on_delta: Option<&DeltaCallback>,
) -> Result<Message, Error> {
    req.tools = func_defs.iter().map(FuncDef::to_model_tool).collect();

    let mut round = 0u32;
    loop {
        round += 1;
        let resp = client.send_request(req.clone(), on_delta.cloned()).await?;
        if resp.is_empty() {
            warn!("the model returned no choice");
            return Err(Error::no_choice());
        }
        if resp.tool_calls.is_empty() {
            debug!("conversation finished after {round} round(s)");
            return Ok(Message::assistant(resp.content));
        }

        debug!(
            "round {round}: model requested {} function call(s)",
            resp.tool_calls.len()
        );
        req.messages.push(ModelMessage::Assistant {
            content: resp.content,
            tool_calls: resp.tool_calls.clone(),
        });
        for call in resp.tool_calls {
            let Some(func_def) = find_func(func_defs, &call.name) else {
                error!("function not found: {}", call.name);
                return Err(Error::function_not_found(&call.name));
            };
            trace!("calling {} with {}", call.name, call.arguments);
            let content = func_def.call(call.arguments.into_bytes()).await?;
            req.messages.push(ModelMessage::Tool(ToolCallResult {
                id: call.id,
                name: call.name,
                content,
            }));
        }
    }
}
