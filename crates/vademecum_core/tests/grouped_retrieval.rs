use rusqlite::Connection;
use vademecum_core::db::open_db_in_memory;
use vademecum_core::{
    schema_for, ContentService, Family, ImportService, RecordGroup, SqliteContentRepository,
};

fn seed_codes(conn: &mut Connection, rows: &[(&str, &str)]) {
    let header: Vec<String> = schema_for(Family::Codes)
        .layout("v2")
        .unwrap()
        .headers
        .iter()
        .map(|header| header.to_string())
        .collect();
    let mut grid = vec![header];
    for (name, article) in rows {
        let mut row = vec![String::new(); 23];
        row[3] = name.to_string();
        row[20] = article.to_string();
        grid.push(row);
    }
    ImportService::new(SqliteContentRepository::new(conn))
        .import_rows(Family::Codes, &grid)
        .unwrap();
}

fn grouped(conn: &mut Connection, priority: &[&str]) -> Vec<RecordGroup> {
    ContentService::new(SqliteContentRepository::new(conn))
        .grouped_by_code(Family::Codes, priority)
        .unwrap()
}

fn codes(groups: &[RecordGroup]) -> Vec<&str> {
    groups.iter().map(|group| group.code.as_str()).collect()
}

#[test]
fn priority_groups_lead_and_the_rest_follow_lexically() {
    let mut conn = open_db_in_memory().unwrap();
    seed_codes(&mut conn, &[("Beta", "1"), ("Zelda", "1"), ("Anexo", "1")]);

    let groups = grouped(&mut conn, &["Zelda", "Anexo"]);
    assert_eq!(codes(&groups), vec!["Zelda", "Anexo", "Beta"]);
    assert_eq!(
        groups.iter().map(|group| group.priority).collect::<Vec<_>>(),
        vec![Some(0), Some(1), None]
    );

    let groups = grouped(&mut conn, &[]);
    assert_eq!(codes(&groups), vec!["Anexo", "Beta", "Zelda"]);
}

#[test]
fn priority_is_case_insensitive_and_deduplicated() {
    let mut conn = open_db_in_memory().unwrap();
    seed_codes(&mut conn, &[("Beta", "1"), ("Zelda", "1"), ("Anexo", "1")]);

    let noisy = grouped(&mut conn, &["zelda", "ZELDA"]);
    let clean = grouped(&mut conn, &["Zelda"]);
    assert_eq!(noisy, clean);
    assert_eq!(codes(&noisy), vec!["Zelda", "Anexo", "Beta"]);
}

#[test]
fn comma_in_code_name_is_matched_whole() {
    let mut conn = open_db_in_memory().unwrap();
    seed_codes(&mut conn, &[("Beta", "1"), ("Lei 8.069, de 1990", "1"), ("Lei 8.069", "1")]);

    let groups = grouped(&mut conn, &[" Lei 8.069, de 1990 "]);
    assert_eq!(codes(&groups), vec!["Lei 8.069, de 1990", "Beta", "Lei 8.069"]);
    assert_eq!(groups[0].priority, Some(0));
    assert_eq!(groups[2].priority, None);
}

#[test]
fn items_keep_insertion_order_and_skip_deleted_rows() {
    let mut conn = open_db_in_memory().unwrap();
    seed_codes(&mut conn, &[("CP", "3"), ("CC", "1"), ("CP", "1"), ("CP", "2")]);

    {
        let service = ContentService::new(SqliteContentRepository::new(&mut conn));
        let victim = service
            .list(Family::Codes)
            .unwrap()
            .into_iter()
            .find(|record| record.get("num_artigo") == Some("1") && record.get("nomecodigo") == Some("CP"))
            .unwrap();
        service.delete(Family::Codes, victim.identifier()).unwrap();
    }

    let groups = grouped(&mut conn, &["CP"]);
    assert_eq!(codes(&groups), vec!["CP", "CC"]);
    let articles: Vec<_> = groups[0]
        .items
        .iter()
        .map(|item| item.get("num_artigo").unwrap())
        .collect();
    assert_eq!(articles, vec!["3", "2"]);
}

#[test]
fn groups_serialize_with_code_priority_and_items() {
    let mut conn = open_db_in_memory().unwrap();
    seed_codes(&mut conn, &[("CC", "1")]);

    let json = serde_json::to_value(grouped(&mut conn, &["CC"])).unwrap();
    assert_eq!(json[0]["code"], "CC");
    assert_eq!(json[0]["priority"], 0);
    assert_eq!(json[0]["items"][0]["nomecodigo"], "CC");
    assert!(json[0]["items"][0]["idcodigo"].is_string());
}
