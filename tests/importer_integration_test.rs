// ==========================================
// BulkImporter 集成测试
// ==========================================
// 测试目标: 验证完整的导入流程
//   解析 → 分类 → 建档 → 计数 → 恢复文件
// ==========================================


use chrono::{TimeZone, Utc};
use repo_bulk_ingest::importer::{BulkImporter, BulkImporterImpl};
use repo_bulk_ingest::repository::EntryRepository;
use repo_bulk_ingest::{
    logging, DispatchMode, EntryError, EntryStatus, FieldMapping, ImportError, ImporterConfig,
    ObjectType, RunState, TenantContext,
};
use test_helpers::{create_test_repo, write_csv, SequentialIdGenerator, SharedDispatcher};

/// 基础导入配置,created_at 固定便于路径断言
fn base_config(id: i64) -> ImporterConfig {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    ImporterConfig::new(id, created_at)
}

#[tokio::test]
async fn test_import_classifies_and_counts_four_rows() {
    logging::init_test();

    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(
        temp.path(),
        "source.csv",
        "source_identifier,model,title\n\
         c1,collection,第一集合\n\
         c2,Collection,第二集合\n\
         w1,,第一作品\n\
         w2,,第二作品\n",
    );

    let (dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        base_config(1),
        TenantContext::single_tenant("acc", "site"),
        boxed,
        None,
    )
    .expect("创建导入器失败");

    let run = importer.import(&csv_path).await.expect("导入应成功");

    // 大小写不敏感的模型分类,未标注行默认为作品
    assert_eq!(run.total, 4);
    assert_eq!(run.collections_total, 2);
    assert_eq!(run.succeeded_count, 4);
    assert_eq!(run.failed_count, 0);
    assert_eq!(run.state, RunState::Completed);

    // 集合桶先于作品桶派发,默认延迟调度
    let calls = dispatcher.calls();
    let identifiers: Vec<&str> = calls.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(identifiers, vec!["c1", "c2", "w1", "w2"]);
    assert!(calls.iter().all(|(_, _, mode)| *mode == "later"));
}

#[tokio::test]
async fn test_import_duplicate_identifier_creates_one_entry() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(
        temp.path(),
        "dup.csv",
        "source_identifier,title\nw1,初版\nw1,重复行\n",
    );

    let (dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        base_config(2),
        TenantContext::single_tenant("acc", "site"),
        boxed,
        None,
    )
    .expect("创建导入器失败");

    let run = importer.import(&csv_path).await.expect("导入应成功");

    // 首次出现生效,重复行静默跳过且不进失败计数
    assert_eq!(run.total, 2);
    assert_eq!(run.succeeded_count, 1);
    assert_eq!(run.failed_count, 0);
    assert_eq!(dispatcher.count(), 1);
}

#[tokio::test]
async fn test_import_missing_identifier_without_generator_fails_row() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(temp.path(), "blank.csv", "title\n无标识作品\n");

    let (dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        base_config(3),
        TenantContext::single_tenant("acc", "site"),
        boxed,
        None,
    )
    .expect("创建导入器失败");

    let run = importer.import(&csv_path).await.expect("导入应完成");

    // 无标识且无生成器: 行失败,不建档,不派发
    assert_eq!(run.total, 1);
    assert_eq!(run.succeeded_count, 0);
    assert_eq!(run.failed_count, 1);
    assert_eq!(dispatcher.count(), 0);
}

#[tokio::test]
async fn test_import_generator_fills_missing_identifier() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(temp.path(), "blank.csv", "title\n无标识作品\n");

    let (dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        base_config(4),
        TenantContext::single_tenant("acc", "site"),
        boxed,
        Some(Box::new(SequentialIdGenerator::new("gen"))),
    )
    .expect("创建导入器失败");

    let run = importer.import(&csv_path).await.expect("导入应成功");

    assert_eq!(run.succeeded_count, 1);
    assert_eq!(run.failed_count, 0);
    assert_eq!(dispatcher.calls()[0].0, "gen_1");
}

#[tokio::test]
async fn test_import_flagged_mapping_overrides_literal_column() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(
        temp.path(),
        "flagged.csv",
        "object_id,source_identifier,title\nobj-9,literal-1,作品\n",
    );

    let mut config = base_config(5);
    config.field_mappings.insert(
        "identifier".to_string(),
        FieldMapping {
            from: vec!["object_id".to_string()],
            source_identifier: true,
            ..FieldMapping::default()
        },
    );

    let (dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        config,
        TenantContext::single_tenant("acc", "site"),
        boxed,
        None,
    )
    .expect("创建导入器失败");

    importer.import(&csv_path).await.expect("导入应成功");

    // 带标志的映射列优先于字面 source_identifier 列
    assert_eq!(dispatcher.calls()[0].0, "obj-9");
}

#[tokio::test]
async fn test_import_file_set_records_parent_identifier() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(
        temp.path(),
        "filesets.csv",
        "source_identifier,model,parent_column\nf1,FileSet,w1\n",
    );

    let mut config = base_config(6);
    config.field_mappings.insert(
        "parents".to_string(),
        FieldMapping {
            from: vec!["parent_column".to_string()],
            related_parents_field_mapping: true,
            ..FieldMapping::default()
        },
    );

    let repo_reader = repo.clone();
    let (_dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        config,
        TenantContext::single_tenant("acc", "site"),
        boxed,
        None,
    )
    .expect("创建导入器失败");
    importer.import(&csv_path).await.expect("导入应成功");

    let entries = repo_reader
        .list_entries(&importer.run().owner_id)
        .await
        .expect("读回条目失败");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].object_type, ObjectType::FileSet);
    assert_eq!(entries[0].parent_identifier.as_deref(), Some("w1"));
}

#[tokio::test]
async fn test_import_immediate_dispatch_policy() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(temp.path(), "works.csv", "source_identifier,title\nw1,作品\n");

    let mut config = base_config(7);
    config.dispatch.works = DispatchMode::Immediate;

    let (dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        config,
        TenantContext::single_tenant("acc", "site"),
        boxed,
        None,
    )
    .expect("创建导入器失败");

    importer.import(&csv_path).await.expect("导入应成功");

    assert_eq!(dispatcher.calls(), vec![(
        "w1".to_string(),
        importer.run().run_id.clone(),
        "now"
    )]);
}

#[tokio::test]
async fn test_import_malformed_file_aborts_run() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let bad_path = temp.path().join("bad.csv");
    // 非 UTF-8 字节触发结构性解析失败
    std::fs::write(&bad_path, b"a,b\nx,\xff\xfe\n").expect("写入测试文件失败");

    let (dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(
        repo,
        base_config(8),
        TenantContext::single_tenant("acc", "site"),
        boxed,
        None,
    )
    .expect("创建导入器失败");

    let result = importer.import(&bad_path).await;
    assert!(matches!(result, Err(ImportError::CsvParseError(_))));

    // 运行记为 ABORTED 并带致命错误,无任何派发
    assert_eq!(importer.run().state, RunState::Aborted);
    assert!(importer.run().fatal_error.is_some());
    assert_eq!(dispatcher.count(), 0);
}

#[tokio::test]
async fn test_errored_entries_file_excludes_collections() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let repo_reader = repo.clone();
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(
        temp.path(),
        "mixed.csv",
        "source_identifier,model,title\nc1,collection,集合\nw1,,作品一\nw2,,作品二\n",
    );

    let mut tenant = TenantContext::single_tenant("acc", "site");
    tenant.import_path = temp.path().join("imports");

    let (_dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(repo, base_config(9), tenant, boxed, None)
        .expect("创建导入器失败");
    importer.import(&csv_path).await.expect("导入应成功");

    // 作业回调将 c1 与 w2 标记为失败
    let owner = importer.run().owner_id.clone();
    repo_reader
        .update_entry_status(
            &owner,
            "c1",
            ObjectType::Collection,
            EntryStatus::Failed,
            Some(EntryError::new("JobError", "集合创建失败")),
        )
        .await
        .expect("更新集合状态失败");
    repo_reader
        .update_entry_status(
            &owner,
            "w2",
            ObjectType::Work,
            EntryStatus::Failed,
            Some(EntryError::new("JobError", "作品创建失败")),
        )
        .await
        .expect("更新作品状态失败");

    let written = importer
        .write_errored_entries_file()
        .await
        .expect("写修正文件失败");
    assert!(written);

    // 路径逐位一致: <import_path>/<importerId>_<createdAt compact>/failed_corrected_entries.csv
    let dest = temp
        .path()
        .join("imports/9_20240102030405/failed_corrected_entries.csv");
    let content = std::fs::read_to_string(&dest).expect("读取修正文件失败");

    // 集合失败不进修正文件,仅含失败作品的原始行
    assert_eq!(content, "source_identifier,model,title\nw2,,作品二\n");
}

#[tokio::test]
async fn test_errored_entries_file_noop_when_no_failures() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");
    let csv_path = write_csv(temp.path(), "clean.csv", "source_identifier,title\nw1,作品\n");

    let mut tenant = TenantContext::single_tenant("acc", "site");
    tenant.import_path = temp.path().join("imports");

    let (_dispatcher, boxed) = SharedDispatcher::new();
    let mut importer = BulkImporterImpl::new(repo, base_config(10), tenant, boxed, None)
        .expect("创建导入器失败");
    importer.import(&csv_path).await.expect("导入应成功");

    let written = importer
        .write_errored_entries_file()
        .await
        .expect("写修正文件失败");
    assert!(!written);
}

#[tokio::test]
async fn test_partial_import_file_moved_to_run_dir() {
    let (_db, repo) = create_test_repo().expect("创建测试仓储失败");
    let temp = tempfile::tempdir().expect("创建临时目录失败");

    let mut tenant = TenantContext::multi_tenant("library", "acc", "site");
    tenant.import_path = temp.path().join("imports");

    let (_dispatcher, boxed) = SharedDispatcher::new();
    let importer = BulkImporterImpl::new(repo, base_config(11), tenant, boxed, None)
        .expect("创建导入器失败");

    let uploaded = write_csv(temp.path(), "ok.csv", "source_identifier,title\nw1,修正\n");
    let dest = importer
        .write_partial_import_file(&uploaded)
        .await
        .expect("移动修正文件失败");

    // 多租户前缀参与路径: imports/<account>/<importerId>_<createdAt compact>
    assert_eq!(
        dest,
        temp.path()
            .join("imports/library/11_20240102030405/ok_corrected_entries.csv")
    );
    assert!(dest.exists());
    // 移动而非复制
    assert!(!uploaded.exists());
}
