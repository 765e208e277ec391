mod common;

#[tokio::test]
async fn group_by_summarize() {
    let result = common::test_translation("group_by_summarize")
        .await
        .unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn filter_rank_within_group() {
    let result = common::test_translation("filter_rank_within_group")
        .await
        .unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn mutate_then_head() {
    let result = common::test_translation("mutate_then_head").await.unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn count_sorted() {
    let result = common::test_translation("count_sorted").await.unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn inner_join_on_shared_key() {
    let result = common::test_translation("inner_join_on_shared_key")
        .await
        .unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn filter_with_string_literal() {
    let result = common::test_translation("filter_with_string_literal")
        .await
        .unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn group_by_window_label() {
    let result = common::test_translation("group_by_window_label")
        .await
        .unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn arrange_twice() {
    let result = common::test_translation("arrange_twice").await.unwrap();
    insta::assert_snapshot!(result);
}

#[tokio::test]
async fn unknown_collections_are_rejected() {
    let result = common::test_translation("unknown_collection").await;
    let message = result.unwrap_err().to_string();
    assert!(message.contains("nobody"), "unexpected error: {message}");
}
