use chrono::NaiveDate;
use examdb_core::{
    export_students, import_records, import_students, ErrorKind, FieldMap, ImportTarget,
    NewExam, NewQuestion, RecordsService, STUDENT_BACKUP_COLUMNS,
};
use serde_json::json;

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

#[test]
fn exported_students_reimport_with_same_identity_fields() {
    let source = RecordsService::open_in_memory().unwrap();
    let exam = source.create_exam(&NewExam::new("E-1")).unwrap();
    let question = source.create_question(&NewQuestion::new("Q-1")).unwrap();
    source.add_student(&fields(json!({
        "name": "Mina",
        "birth_date": "2009-11-30",
        "exam_scores": [{"exam_id": exam, "score": 88}],
        "exam_questions": [question]
    })));
    source.add_student(&fields(json!({"name": "Jun", "birth_date": "2011-01-02"})));

    let rows = export_students(&source.list_students());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cells().len(), STUDENT_BACKUP_COLUMNS.len());
    assert_eq!(rows[1].exam_scores, "[]");

    let target = RecordsService::open_in_memory().unwrap();
    let report = import_students(&target, rows.iter().map(|row| row.to_fields()));
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.applied, 2);

    let expected: Vec<(String, String, i32)> = rows
        .iter()
        .map(|row| (row.name.clone(), row.birth_date.clone(), row.age))
        .collect();
    let restored: Vec<(String, String, i32)> = export_students(&target.list_students())
        .into_iter()
        .map(|row| (row.name, row.birth_date, row.age))
        .collect();
    assert_eq!(restored, expected);
}

#[test]
fn exported_links_resolve_against_the_same_store() {
    let service = RecordsService::open_in_memory().unwrap();
    let exam = service.create_exam(&NewExam::new("E-1")).unwrap();
    service.add_student(&fields(json!({
        "name": "Mina",
        "birth_date": "2009-11-30",
        "exam_scores": [{"exam_id": exam, "score": 70}]
    })));

    let row = export_students(&service.list_students()).remove(0);
    service.delete_student("Mina");
    let outcome = service.add_student(&row.to_fields());
    assert!(outcome.ok, "{}", outcome.message);

    let student = service.get_student(outcome.id.unwrap()).unwrap().unwrap();
    assert_eq!(student.birth_date, NaiveDate::from_ymd_opt(2009, 11, 30).unwrap());
    assert_eq!(student.exam_scores.len(), 1);
    assert_eq!(student.exam_scores[0].score, Some(70));
}

#[test]
fn import_counts_failures_without_aborting_the_batch() {
    let service = RecordsService::open_in_memory().unwrap();

    let report = import_students(
        &service,
        vec![
            fields(json!({"name": "A", "birth_date": "2010-01-01"})),
            fields(json!({"name": "B", "birth_date": "not a date"})),
            fields(json!({"name": "C", "birth_date": "2010-02-02", "age": 9})),
            fields(json!({"name": "D", "birth_date": "2010-03-03"})),
        ],
    );

    assert_eq!(report.applied, 2);
    let failed: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![1, 2]);
    assert!(report
        .failures
        .iter()
        .all(|f| f.kind == Some(ErrorKind::Validation)));
    assert_eq!(service.list_students().len(), 2);
}

#[test]
fn update_import_reports_missing_rows_as_not_found() {
    let service = RecordsService::open_in_memory().unwrap();
    let tag = service
        .add_tag(&fields(json!({"content": "draft"})))
        .id
        .unwrap();

    let report = import_records(
        &service,
        ImportTarget::UpdateTags,
        vec![
            fields(json!({"id": tag, "content": "final"})),
            fields(json!({"id": tag + 100, "content": "ghost"})),
        ],
    );

    assert_eq!(report.applied, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, Some(ErrorKind::NotFound));
    assert_eq!(service.list_tags()[0].content, "final");
}
