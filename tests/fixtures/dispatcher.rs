use crate::rpc::{DispatcherError, DispatcherResult, MmRpcRequest};
use common::HttpStatusCode;
use mm2_core::mm_ctx::MmArc;

pub async fn process_single_request(ctx: MmArc, req: Json) -> DispatcherResult<Response<Vec<u8>>> {
    let request: MmRpcRequest = json::from_value(req)?;
    auth(&request, &ctx).await?;
    dispatcher_v2(request, ctx).await
}

async fn dispatcher_v2(request: MmRpcRequest, ctx: MmArc) -> DispatcherResult<Response<Vec<u8>>> {
    if let Some(task_method) = request.method.strip_prefix("task::") {
        let task_method = task_method.to_string();
        return rpc_task_dispatcher(request, ctx, task_method).await;
    }
    if let Some(stream_method) = request.method.strip_prefix("stream::") {
        let stream_method = stream_method.to_string();
        return rpc_streaming_dispatcher(request, ctx, stream_method).await;
    }

    match request.method.as_str() {
        "get_enabled_coins" => handle_mmrpc(ctx, request, get_enabled_coins).await,
        "my_tx_history" => handle_mmrpc(ctx, request, my_tx_history).await,
        "withdraw" => handle_mmrpc(ctx, request, withdraw).await,
        "trade_preimage" | "trade_preimage_v2" => handle_mmrpc(ctx, request, trade_preimage_rpc).await,
        #[cfg(not(target_arch = "wasm32"))]
        native_only_methods => match native_only_methods {
            "get_public_key" => handle_mmrpc(ctx, request, get_public_key).await,
            _ => MmError::err(DispatcherError::NoSuchMethod),
        },
        _ => MmError::err(DispatcherError::NoSuchMethod),
    }
}

async fn rpc_task_dispatcher(
    request: MmRpcRequest,
    ctx: MmArc,
    task_method: String,
) -> DispatcherResult<Response<Vec<u8>>> {
    match task_method.as_str() {
        "enable_eth::init" => handle_mmrpc(ctx, request, init_standalone_coin::<EthCoin>).await,
        "enable_eth::status" => handle_mmrpc(ctx, request, init_standalone_coin_status::<EthCoin>).await,
        "enable_eth::cancel" => handle_mmrpc(ctx, request, cancel_init_standalone_coin::<EthCoin>).await,
        "withdraw::init" => handle_mmrpc(ctx, request, init_withdraw).await,
        _ => MmError::err(DispatcherError::NoSuchMethod),
    }
}

async fn rpc_streaming_dispatcher(
    request: MmRpcRequest,
    ctx: MmArc,
    streaming_request: String,
) -> DispatcherResult<Response<Vec<u8>>> {
    match streaming_request.as_str() {
        "balance::enable" => handle_mmrpc(ctx, request, streaming_activations::enable_balance).await,
        "disable" => handle_mmrpc(ctx, request, streaming_activations::disable_streamer).await,
        _ => MmError::err(DispatcherError::NoSuchMethod),
    }
}

async fn auth(request: &MmRpcRequest, ctx: &MmArc) -> DispatcherResult<()> {
    match request.userpass {
        Some(ref userpass) if ctx.is_valid_rpc_password(userpass) => Ok(()),
        _ => MmError::err(DispatcherError::UserpassIsInvalid),
    }
}
