use chrono::{Datelike, Local, NaiveDate};
use examdb_core::{
    ErrorKind, FieldMap, NewExam, NewQuestion, NewStudent, RecordsError, RecordsService,
    ScoreEntry, StudentPatch,
};
use serde_json::json;

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn count(service: &RecordsService, sql: &str, id: i64) -> i64 {
    service
        .connection()
        .query_row(sql, [id], |row| row.get(0))
        .unwrap()
}

#[test]
fn add_student_stores_year_difference_as_age() {
    let service = RecordsService::open_in_memory().unwrap();

    let outcome = service.add_student(&fields(json!({
        "name": "Zhang San",
        "birth_date": "2010-12-31"
    })));
    assert!(outcome.ok, "{}", outcome.message);

    let students = service.list_students();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].name, "Zhang San");
    assert_eq!(students[0].age, Local::now().year() - 2010);
}

#[test]
fn add_student_with_wrong_field_type_fails_validation_without_write() {
    let service = RecordsService::open_in_memory().unwrap();

    let outcome = service.add_student(&fields(json!({
        "name": "Li Si",
        "birth_date": 20100101
    })));
    assert!(!outcome.ok);
    assert_eq!(outcome.kind, Some(ErrorKind::Validation));
    assert!(service.list_students().is_empty());
}

#[test]
fn add_student_links_existing_exams_and_questions_and_skips_missing() {
    let service = RecordsService::open_in_memory().unwrap();
    let exam_id = service.create_exam(&NewExam::new("E-1")).unwrap();
    let question_id = service.create_question(&NewQuestion::new("Q-1")).unwrap();

    let mut student = NewStudent::new("Wang Wu", date(2012, 4, 1));
    student.exam_scores = vec![
        ScoreEntry {
            exam_id,
            score: Some(87),
        },
        ScoreEntry {
            exam_id: 404,
            score: Some(10),
        },
    ];
    student.question_ids = vec![question_id, 505];
    let student_id = service.create_student(&student).unwrap();

    let loaded = service.get_student(student_id).unwrap().unwrap();
    assert_eq!(loaded.exam_scores.len(), 1);
    assert_eq!(loaded.exam_scores[0].exam_number, "E-1");
    assert_eq!(loaded.exam_scores[0].score, Some(87));
    assert_eq!(loaded.question_links.len(), 1);
    assert_eq!(loaded.question_links[0].question_id, question_id);
}

#[test]
fn update_student_changes_only_supplied_fields() {
    let service = RecordsService::open_in_memory().unwrap();
    let exam_id = service.create_exam(&NewExam::new("E-1")).unwrap();
    let target = service
        .create_student(&NewStudent::new("Zhao Liu", date(2011, 6, 1)))
        .unwrap();
    let other = service
        .create_student(&NewStudent::new("Sun Qi", date(2009, 1, 1)))
        .unwrap();
    service.set_exam_score(target, exam_id, Some(75)).unwrap();
    let other_before = service.get_student(other).unwrap().unwrap();

    let outcome = service.update_student_fields(&fields(json!({"id": target, "name": "N2"})));
    assert!(outcome.ok, "{}", outcome.message);
    assert_eq!(outcome.id, Some(target));

    let updated = service.get_student(target).unwrap().unwrap();
    assert_eq!(updated.name, "N2");
    assert_eq!(updated.birth_date, date(2011, 6, 1));
    assert_eq!(updated.age, Local::now().year() - 2011);
    assert_eq!(updated.exam_scores.len(), 1);
    assert_eq!(updated.exam_scores[0].score, Some(75));
    assert_eq!(service.get_student(other).unwrap().unwrap(), other_before);
}

#[test]
fn update_student_with_birth_date_recomputes_age() {
    let service = RecordsService::open_in_memory().unwrap();
    let id = service
        .create_student(&NewStudent::new("Chen", date(2011, 6, 1)))
        .unwrap();

    service
        .update_student(&StudentPatch {
            id,
            name: None,
            birth_date: Some(date(2008, 2, 2)),
        })
        .unwrap();

    let updated = service.get_student(id).unwrap().unwrap();
    assert_eq!(updated.age, Local::now().year() - 2008);
}

#[test]
fn update_student_rejects_unknown_keys_and_missing_rows() {
    let service = RecordsService::open_in_memory().unwrap();
    let id = service
        .create_student(&NewStudent::new("Chen", date(2011, 6, 1)))
        .unwrap();

    let unknown = service.update_student_fields(&fields(json!({"id": id, "age": 3})));
    assert_eq!(unknown.kind, Some(ErrorKind::Validation));
    assert_eq!(service.get_student(id).unwrap().unwrap().name, "Chen");

    let missing = service.update_student_fields(&fields(json!({"id": 999, "name": "X"})));
    assert!(!missing.ok);
    assert_eq!(missing.kind, Some(ErrorKind::NotFound));
}

#[test]
fn delete_student_removes_all_score_and_question_links() {
    let service = RecordsService::open_in_memory().unwrap();
    let exam_id = service.create_exam(&NewExam::new("E-1")).unwrap();
    let question_id = service.create_question(&NewQuestion::new("Q-1")).unwrap();
    let student_id = service
        .create_student(&NewStudent::new("Zhou Ba", date(2010, 1, 1)))
        .unwrap();
    service.set_exam_score(student_id, exam_id, Some(60)).unwrap();
    service.link_student_question(student_id, question_id).unwrap();

    let outcome = service.delete_student("Zhou Ba");
    assert!(outcome.ok, "{}", outcome.message);
    assert_eq!(outcome.id, Some(student_id));

    assert!(service.list_students().is_empty());
    assert_eq!(
        count(
            &service,
            "SELECT COUNT(*) FROM student_exam_scores WHERE student_id = ?1;",
            student_id
        ),
        0
    );
    assert_eq!(
        count(
            &service,
            "SELECT COUNT(*) FROM student_questions WHERE student_id = ?1;",
            student_id
        ),
        0
    );
    assert!(service.get_exam(exam_id).unwrap().unwrap().student_ids.is_empty());
    assert!(service
        .get_question(question_id)
        .unwrap()
        .unwrap()
        .student_ids
        .is_empty());
}

#[test]
fn delete_student_by_duplicate_name_removes_lowest_id_only() {
    let service = RecordsService::open_in_memory().unwrap();
    let first = service
        .create_student(&NewStudent::new("Twin", date(2010, 1, 1)))
        .unwrap();
    let second = service
        .create_student(&NewStudent::new("Twin", date(2010, 1, 1)))
        .unwrap();

    assert_eq!(service.delete_student_by_name("Twin").unwrap(), first);
    let remaining = service.list_students();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second);
}

#[test]
fn delete_unknown_student_reports_not_found() {
    let service = RecordsService::open_in_memory().unwrap();
    let err = service.delete_student_by_name("Nobody").unwrap_err();
    assert!(matches!(err, RecordsError::NotFound { entity: "student", .. }));
}

#[test]
fn set_exam_score_overwrites_previous_score_and_checks_endpoints() {
    let service = RecordsService::open_in_memory().unwrap();
    let exam_id = service.create_exam(&NewExam::new("E-1")).unwrap();
    let student_id = service
        .create_student(&NewStudent::new("Wu", date(2010, 1, 1)))
        .unwrap();

    service.set_exam_score(student_id, exam_id, None).unwrap();
    service.set_exam_score(student_id, exam_id, Some(93)).unwrap();
    let scores = service.get_student(student_id).unwrap().unwrap().exam_scores;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score, Some(93));

    let err = service.set_exam_score(student_id, 404, Some(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
