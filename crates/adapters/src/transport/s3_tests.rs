// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use std::path::Path;

fn offline_client() -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

#[tokio::test]
async fn url_joins_bucket_prefix_and_path() {
    let cases = [
        ("s3://bucket", "s3://bucket/pkg/app.tar.gz"),
        ("s3://bucket/builds/7", "s3://bucket/builds/7/pkg/app.tar.gz"),
    ];
    let artifact = bk_core::test_support::artifact("j1", Path::new("/w"), "pkg/app.tar.gz");

    for (raw, expected) in cases {
        let mut transport = S3Transport::with_client(offline_client());
        transport.setup(&Destination::parse(raw).unwrap()).await.unwrap();
        assert_eq!(transport.url(&artifact), expected, "destination {raw}");
    }
}

#[tokio::test]
async fn setup_rejects_form_destination() {
    let mut transport = S3Transport::with_client(offline_client());
    assert!(matches!(
        transport.setup(&Destination::Form).await,
        Err(TransportError::Unsupported(_))
    ));
}

#[tokio::test]
async fn upload_before_setup_is_not_configured() {
    let transport = S3Transport::new();
    let artifact = bk_core::test_support::artifact("j1", Path::new("/w"), "a.log");
    assert!(matches!(
        transport.upload(&artifact).await,
        Err(TransportError::NotConfigured)
    ));
}
