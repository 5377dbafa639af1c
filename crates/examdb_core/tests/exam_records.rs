use chrono::NaiveDate;
use examdb_core::{
    ErrorKind, ExamPatch, FieldMap, NewQuestion, NewStudent, NewTag, RecordsService,
};
use serde_json::json;

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

fn student(service: &RecordsService, name: &str) -> i64 {
    service
        .create_student(&NewStudent::new(
            name,
            NaiveDate::from_ymd_opt(2010, 3, 3).unwrap(),
        ))
        .unwrap()
}

#[test]
fn add_exam_with_non_list_student_ids_fails_and_writes_nothing() {
    let service = RecordsService::open_in_memory().unwrap();

    let outcome = service.add_exam(&fields(json!({
        "exam_number": "E-1",
        "student_ids": "1,2,3"
    })));
    assert!(!outcome.ok);
    assert_eq!(outcome.kind, Some(ErrorKind::Validation));
    assert!(service.list_exams().is_empty());
}

#[test]
fn add_exam_with_non_integer_question_ids_fails_and_writes_nothing() {
    let service = RecordsService::open_in_memory().unwrap();
    let sid = student(&service, "A");

    let outcome = service.add_exam(&fields(json!({
        "exam_number": "E-1",
        "student_ids": [sid],
        "question_ids": [1.5]
    })));
    assert_eq!(outcome.kind, Some(ErrorKind::Validation));
    assert!(service.list_exams().is_empty());
    assert!(service.get_student(sid).unwrap().unwrap().exam_scores.is_empty());
}

#[test]
fn add_exam_skips_missing_question_ids_but_creates_exam() {
    let service = RecordsService::open_in_memory().unwrap();
    let q1 = service.create_question(&NewQuestion::new("Q-1")).unwrap();

    let outcome = service.add_exam(&fields(json!({
        "exam_number": "E-1",
        "organization": "District Board",
        "time": "spring term, week 3",
        "question_ids": [q1, 9999]
    })));
    assert!(outcome.ok, "{}", outcome.message);

    let exams = service.list_exams();
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].question_ids, vec![q1]);
    assert_eq!(exams[0].time.as_deref(), Some("spring term, week 3"));
}

#[test]
fn add_exam_creates_empty_score_links_for_listed_students() {
    let service = RecordsService::open_in_memory().unwrap();
    let a = student(&service, "A");
    let b = student(&service, "B");

    let outcome = service.add_exam(&fields(json!({
        "exam_number": "E-7",
        "student_ids": [a, b, 404]
    })));
    let exam_id = outcome.id.unwrap();

    let exam = service.get_exam(exam_id).unwrap().unwrap();
    assert_eq!(exam.student_ids, vec![a, b]);
    let scores = service.get_student(a).unwrap().unwrap().exam_scores;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].exam_id, exam_id);
    assert_eq!(scores[0].score, None);
}

#[test]
fn exam_question_and_tag_membership_is_visible_from_both_sides() {
    let service = RecordsService::open_in_memory().unwrap();
    let q = service.create_question(&NewQuestion::new("Q-1")).unwrap();
    let t = service.create_tag(&NewTag::new("geometry")).unwrap();

    let exam_id = service
        .add_exam(&fields(json!({
            "exam_number": "E-1",
            "question_ids": [q],
            "tag_ids": [t]
        })))
        .id
        .unwrap();

    assert_eq!(
        service.get_question(q).unwrap().unwrap().exam_ids,
        vec![exam_id]
    );
    assert_eq!(service.get_tag(t).unwrap().unwrap().exam_ids, vec![exam_id]);
}

#[test]
fn delete_missing_exam_reports_not_found_and_keeps_existing_exams() {
    let service = RecordsService::open_in_memory().unwrap();
    service.add_exam(&fields(json!({"exam_number": "E-1"})));
    service.add_exam(&fields(json!({"exam_number": "E-2"})));
    let before = service.list_exams();

    let outcome = service.delete_exam("E-404");
    assert!(!outcome.ok);
    assert_eq!(outcome.kind, Some(ErrorKind::NotFound));
    assert!(outcome.message.contains("E-404"));
    assert_eq!(service.list_exams(), before);
}

#[test]
fn delete_exam_removes_links_but_keeps_questions_and_students() {
    let service = RecordsService::open_in_memory().unwrap();
    let sid = student(&service, "A");
    let q = service.create_question(&NewQuestion::new("Q-1")).unwrap();
    let t = service.create_tag(&NewTag::new("mock")).unwrap();
    service.add_exam(&fields(json!({
        "exam_number": "E-1",
        "student_ids": [sid],
        "question_ids": [q],
        "tag_ids": [t]
    })));

    let outcome = service.delete_exam("E-1");
    assert!(outcome.ok, "{}", outcome.message);

    assert!(service.list_exams().is_empty());
    let question = service.get_question(q).unwrap().unwrap();
    assert!(question.exam_ids.is_empty());
    assert!(service.get_tag(t).unwrap().unwrap().exam_ids.is_empty());
    assert!(service.get_student(sid).unwrap().unwrap().exam_scores.is_empty());
}

#[test]
fn update_exam_overwrites_supplied_fields_only() {
    let service = RecordsService::open_in_memory().unwrap();
    let q = service.create_question(&NewQuestion::new("Q-1")).unwrap();
    let exam_id = service
        .add_exam(&fields(json!({
            "exam_number": "E-1",
            "organization": "School",
            "paper_file": "papers/e1.pdf",
            "question_ids": [q]
        })))
        .id
        .unwrap();

    service
        .update_exam(&ExamPatch {
            id: exam_id,
            organization: Some(Some("District".to_string())),
            ..ExamPatch::default()
        })
        .unwrap();

    let exam = service.get_exam(exam_id).unwrap().unwrap();
    assert_eq!(exam.exam_number, "E-1");
    assert_eq!(exam.organization.as_deref(), Some("District"));
    assert_eq!(exam.paper_file.as_deref(), Some("papers/e1.pdf"));
    assert_eq!(exam.question_ids, vec![q]);
}

#[test]
fn update_exam_rejects_association_lists_and_blank_numbers() {
    let service = RecordsService::open_in_memory().unwrap();
    let exam_id = service
        .add_exam(&fields(json!({"exam_number": "E-1"})))
        .id
        .unwrap();

    let lists = service.update_exam_fields(&fields(json!({"id": exam_id, "student_ids": []})));
    assert_eq!(lists.kind, Some(ErrorKind::Validation));

    let blank = service.update_exam_fields(&fields(json!({"id": exam_id, "exam_number": " "})));
    assert_eq!(blank.kind, Some(ErrorKind::Validation));
    assert_eq!(
        service.get_exam(exam_id).unwrap().unwrap().exam_number,
        "E-1"
    );
}

#[test]
fn update_exam_with_null_clears_nullable_field() {
    let service = RecordsService::open_in_memory().unwrap();
    let exam_id = service
        .add_exam(&fields(json!({
            "exam_number": "E-1",
            "organization": "School",
            "paper_file": "papers/e1.pdf"
        })))
        .id
        .unwrap();

    let outcome = service.update_exam_fields(&fields(json!({"id": exam_id, "paper_file": null})));
    assert!(outcome.ok, "{}", outcome.message);

    let exam = service.get_exam(exam_id).unwrap().unwrap();
    assert_eq!(exam.paper_file, None);
    assert_eq!(exam.organization.as_deref(), Some("School"));
}

#[test]
fn failed_association_write_rolls_back_the_whole_exam() {
    let service = RecordsService::open_in_memory().unwrap();
    let sid = student(&service, "A");
    let tag = service.create_tag(&NewTag::new("final")).unwrap();
    service
        .connection()
        .execute_batch("DROP TABLE exam_tags;")
        .unwrap();

    let outcome = service.add_exam(&fields(json!({
        "exam_number": "E-1",
        "student_ids": [sid],
        "tag_ids": [tag]
    })));
    assert!(!outcome.ok);
    assert_eq!(outcome.kind, Some(ErrorKind::Storage));

    let exam_rows: i64 = service
        .connection()
        .query_row("SELECT COUNT(*) FROM exams;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(exam_rows, 0);
    assert!(service.get_student(sid).unwrap().unwrap().exam_scores.is_empty());
}

#[test]
fn list_exams_degrades_to_empty_on_read_failure() {
    let service = RecordsService::open_in_memory().unwrap();
    service.add_exam(&fields(json!({"exam_number": "E-1"})));
    assert_eq!(service.list_exams().len(), 1);

    service
        .connection()
        .execute_batch("DROP TABLE exam_tags;")
        .unwrap();

    assert!(service.list_exams().is_empty());
    assert!(service.get_exam(1).is_err());
}
