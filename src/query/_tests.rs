pub mod fixtures {
    use serde_json::json;
    use crate::database::{Db, DbCollection, DbCommon, DbConfig};

    /// publishers <- authors <- books, with one author lacking a publisher and
    /// one book lacking an author.
    pub fn library() -> Db {
        let db = Db::new_db_with_config(DbConfig::int("id"));

        db.create("Publishers").add_batch(json!([
            { "id": 1, "name": "Chilton" },
            { "id": 2, "name": "Ace" }
        ]));
        db.create("Authors").add_batch(json!([
            { "id": 1, "name": "Frank Herbert",     "publisher_id": 1    },
            { "id": 2, "name": "Ursula K. Le Guin", "publisher_id": 2    },
            { "id": 3, "name": "Anonymous",         "publisher_id": null }
        ]));
        db.create("Books").add_batch(json!([
            { "id": 1, "title": "Dune",                      "pages": 412,  "author_id": 1    },
            { "id": 2, "title": "Dune Messiah",              "pages": 256,  "author_id": 1    },
            { "id": 3, "title": "The Left Hand of Darkness", "pages": 304,  "author_id": 2    },
            { "id": 4, "title": "Untitled Notes",            "pages": null, "author_id": null }
        ]));

        db.infer_reference("books", "authors").unwrap();
        db.infer_reference("authors", "publishers").unwrap();
        db
    }
}

mod values_query_tests {
    use serde_json::{json, Value};

    use super::fixtures;
    use crate::{
        database::DbCommon,
        error::NestedValuesError,
        query::{Annotation, Expr, Lookup, RowSource},
    };

    #[test]
    fn plain_rows_follow_requested_order_and_insertion_order() {
        let db = fixtures::library();
        let rows = db.query("books").unwrap()
            .values_list(&["id", "author__name", "title"])
            .unwrap();

        assert_eq!(rows, vec![
            vec![json!(1), json!("Frank Herbert"), json!("Dune")],
            vec![json!(2), json!("Frank Herbert"), json!("Dune Messiah")],
            vec![json!(3), json!("Ursula K. Le Guin"), json!("The Left Hand of Darkness")],
            vec![json!(4), Value::Null, json!("Untitled Notes")],
        ]);
    }

    #[test]
    fn filters_excludes_ordering_and_slicing() {
        let db = fixtures::library();
        let q = db.query("books").unwrap();

        let rows = q.clone().filter("author__name", Lookup::Contains("Herbert".into())).values_list(&["id"]).unwrap();
        assert_eq!(rows, vec![vec![json!(1)], vec![json!(2)]]);

        let rows = q.clone().exclude("author", Lookup::IsNull(true)).order_by("-pages").values_list(&["id"]).unwrap();
        assert_eq!(rows, vec![vec![json!(1)], vec![json!(3)], vec![json!(2)]]);

        let rows = q.clone().order_by("pages").values_list(&["pages"]).unwrap();
        assert_eq!(rows.last().unwrap(), &vec![Value::Null]);

        let rows = q.order_by("id").slice(1, Some(2)).values_list(&["id"]).unwrap();
        assert_eq!(rows, vec![vec![json!(2)], vec![json!(3)]]);
    }

    #[test]
    fn extras_come_first_and_annotations_last_by_name() {
        let db = fixtures::library();
        let q = db.query("authors").unwrap()
            .annotate("n_books", Annotation::count("books"))
            .annotate("max_pages", Annotation::max("books__pages"))
            .extra("shout", Expr::upper(Expr::field("name")))
            .filter("id", Lookup::exact(1));

        let columns: Vec<String> = ["id", "n_books", "name", "max_pages", "shout"].iter().map(|s| s.to_string()).collect();
        let result = q.values_rows(&columns).unwrap();
        assert_eq!(result.layout.extras(), &["shout"]);
        assert_eq!(result.layout.fields(), &["id", "name"]);
        assert_eq!(result.layout.annotations(), &["max_pages", "n_books"]);

        let rows: Vec<Vec<Value>> = result.rows.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![vec![json!("FRANK HERBERT"), json!(1), json!("Frank Herbert"), json!(412), json!(2)]]);
    }

    #[test]
    fn unrequested_annotations_stay_out_of_the_row() {
        let db = fixtures::library();
        let q = db.query("authors").unwrap()
            .annotate("n_books", Annotation::count("books"))
            .annotate("max_pages", Annotation::max("books__pages"))
            .filter("id", Lookup::exact(2));

        let columns = vec!["name".to_string(), "n_books".to_string(), "n_books".to_string()];
        assert_eq!(q.layout_for(&columns).annotations(), &["n_books"]);
        assert_eq!(q.values_list(&["name"]).unwrap(), vec![vec![json!("Ursula K. Le Guin")]]);
    }

    #[test]
    fn rows_are_built_when_pulled() {
        let db = fixtures::library();
        let q = db.query("books").unwrap().order_by("id");
        let columns = vec!["author__name".to_string()];
        let mut rows = q.values_rows(&columns).unwrap().rows;

        assert_eq!(rows.next().unwrap().unwrap(), vec![json!("Frank Herbert")]);
        db.get("authors").unwrap().write().unwrap()
            .update("2", json!({"name": "U. K. Le Guin", "publisher_id": 2}));
        let rest: Vec<Vec<Value>> = rows.collect::<Result<_, _>>().unwrap();
        assert_eq!(rest[1], vec![json!("U. K. Le Guin")]);
    }

    #[test]
    fn annotations_can_be_filtered_and_ordered() {
        let db = fixtures::library();
        let rows = db.query("authors").unwrap()
            .annotate("n_books", Annotation::count("books"))
            .filter("n_books", Lookup::Gte(json!(1)))
            .order_by("n_books")
            .values_list(&["name"])
            .unwrap();

        assert_eq!(rows, vec![vec![json!("Ursula K. Le Guin")], vec![json!("Frank Herbert")]]);
    }

    #[test]
    fn aggregates_over_empty_relations() {
        let db = fixtures::library();
        let rows = db.query("authors").unwrap()
            .annotate("n", Annotation::count("books"))
            .annotate("total", Annotation::sum("books__pages"))
            .filter("id", Lookup::exact(3))
            .values_list(&["n", "total"])
            .unwrap();

        assert_eq!(rows, vec![vec![json!(0), Value::Null]]);
    }

    #[test]
    fn unknown_columns_are_reported_by_the_source() {
        let db = fixtures::library();
        let err = db.query("books").unwrap().values_list(&["id", "author__nickname"]).unwrap_err();
        assert_eq!(err, NestedValuesError::UnknownColumn { path: "author__nickname".into(), segment: "nickname".into() });

        let err = db.query("authors").unwrap()
            .annotate("n", Annotation::count("reviews"))
            .values_list(&["n"])
            .unwrap_err();
        assert!(matches!(err, NestedValuesError::UnknownColumn { segment, .. } if segment == "reviews"));
    }
}
