// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use alloy::transports::http::Http;
use alloy_rpc_client::RpcClient;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url = Self::parse_url(rpc_url)?;
        Ok(RootProvider::new_http(url))
    }

    /// HTTP provider whose requests are routed through `proxy_url`
    /// (`http://`, `https://` or `socks5://`).
    pub fn http_via_proxy(rpc_url: &str, proxy_url: &str) -> Result<HttpProvider, AppError> {
        let url = Self::parse_url(rpc_url)?;
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| AppError::Config(format!("Invalid proxy {}: {}", proxy_url, e)))?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {}", e)))?;

        let transport = Http::with_client(client, url);
        let rpc = RpcClient::new(transport, false);
        Ok(RootProvider::new(rpc))
    }

    /// Pick the proxied or direct connection depending on configuration.
    pub fn preferred(rpc_url: &str, proxy_url: Option<&str>) -> Result<HttpProvider, AppError> {
        match proxy_url {
            Some(proxy) => Self::http_via_proxy(rpc_url, proxy),
            None => Self::http(rpc_url),
        }
    }

    fn parse_url(rpc_url: &str) -> Result<Url, AppError> {
        Url::parse(rpc_url.trim()).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))
    }
}
