//! Integration tests for NetBox client
//!
//! These tests require a running NetBox instance.
//! Set NETBOX_SERVER_URL and NETBOX_API_TOKEN environment variables to run,
//! plus NETBOX_TEST_PREFIX_ID for the allocation test.

use netbox_client::{AvailableIPRequest, ClientConfig, NetBoxClient, NetBoxClientTrait};

fn live_client() -> NetBoxClient {
    let url = std::env::var("NETBOX_SERVER_URL")
        .unwrap_or_else(|_| "http://localhost:8001".to_string());
    let token = std::env::var("NETBOX_API_TOKEN")
        .expect("NETBOX_API_TOKEN environment variable must be set");

    NetBoxClient::with_config(ClientConfig::new(url, token)).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running NetBox instance
async fn test_status() {
    let client = live_client();

    let status = client.status().await.expect("Failed to fetch status");
    println!("Connected to NetBox {}", status.netbox_version);
}

#[tokio::test]
#[ignore]
async fn test_query_services() {
    let client = live_client();

    let page = client.query_services(&[], Some(5)).await
        .expect("Failed to query services");

    assert!(page.results.len() <= 5);
    println!("Found {} services", page.count);
}

#[tokio::test]
#[ignore]
async fn test_allocate_and_delete_from_prefix() {
    let client = live_client();
    let prefix_id: u64 = std::env::var("NETBOX_TEST_PREFIX_ID")
        .expect("NETBOX_TEST_PREFIX_ID environment variable must be set")
        .parse()
        .expect("NETBOX_TEST_PREFIX_ID must be an integer");

    let requests = vec![AvailableIPRequest::default(); 2];
    let ips = client.allocate_prefix_ips(prefix_id, &requests).await
        .expect("Failed to allocate addresses");
    assert_eq!(ips.len(), 2);

    for ip in ips {
        println!("Allocated {}", ip.address);
        client.delete_ip_address(ip.id).await.expect("Failed to clean up address");
    }
}

/// Sweeper: removes addresses left behind by acceptance runs (tagged `acctest`)
#[tokio::test]
#[ignore]
async fn sweep_acctest_ip_addresses() {
    let client = live_client();

    let ips = client.query_ip_addresses(&[("tag", "acctest")], true).await
        .expect("Failed to query IP addresses");

    for ip in ips {
        client.delete_ip_address(ip.id).await.expect("Failed to delete IP address");
        println!("Deleted IP address {}", ip.address);
    }
}
