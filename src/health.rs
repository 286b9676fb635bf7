use std::time::Duration;

/// Best-effort reachability probe of the inference host. Any HTTP answer
/// counts, since the root path of most inference servers is not a 2xx.
pub fn check_inference_host(host: &str) -> bool {
    let client = match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };
    client.get(host.trim_end_matches('/')).send().is_ok()
}
