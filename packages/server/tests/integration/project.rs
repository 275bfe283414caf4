use crate::common::{ADMIN_TOKEN, TestApp, UploadFields, build_zip, routes};

const DEMO_FILES: &[(&str, &str)] = &[
    ("demo/src/main/Foo.java", "class Foo {}"),
    ("demo/README.md", "# demo"),
];

mod project_creation {
    use super::*;

    #[tokio::test]
    async fn upload_creates_project_with_inferred_fields() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "demo-v1.2.3.zip",
                build_zip(DEMO_FILES),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "demo-v1-2-3");
        assert_eq!(res.body["artifactId"], "demo-v1-2-3");
        assert_eq!(res.body["groupId"], "com.example");
        assert_eq!(res.body["version"], "1.2.3");
        assert_eq!(res.body["sourceRootRelativePath"], "demo/src/main");
        assert_eq!(res.body["originalFilename"], "demo-v1.2.3.zip");
        assert_eq!(res.body["uploadedBy"], "admin");
        assert!(res.body["uploadedAt"].is_string());
        assert!(res.body["lastUpdated"].is_string());
        assert_eq!(
            res.body["mavenPath"],
            "com/example/demo-v1-2-3/1.2.3/demo-v1-2-3-1.2.3.jar"
        );
        assert_eq!(
            res.body["dependencyDeclarationBlocks"]["gradle"],
            "implementation 'com.example:demo-v1-2-3:1.2.3'"
        );
        assert!(
            res.body["dependencyDeclarationBlocks"]["maven"]
                .as_str()
                .unwrap()
                .contains("<artifactId>demo-v1-2-3</artifactId>")
        );
    }

    #[tokio::test]
    async fn explicit_name_and_version_win() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "demo-v1.2.3.zip",
                build_zip(DEMO_FILES),
                UploadFields {
                    name: Some("my lib"),
                    version: Some("9.9.9"),
                    ..Default::default()
                },
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "my-lib");
        assert_eq!(res.body["version"], "9.9.9");
    }

    #[tokio::test]
    async fn filename_version_beats_upstream_tags() {
        let app = TestApp::spawn_with(Some(ADMIN_TOKEN), vec!["v3.0.0"]).await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "lib-v1.2.0.zip",
                build_zip(DEMO_FILES),
                UploadFields {
                    name: Some("lib"),
                    upstream_url: Some("https://github.com/acme/lib"),
                    ..Default::default()
                },
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["version"], "1.2.0");
        assert_eq!(res.body["upstreamUrl"], "https://github.com/acme/lib");
    }

    #[tokio::test]
    async fn upstream_tags_used_without_filename_version() {
        let app =
            TestApp::spawn_with(Some(ADMIN_TOKEN), vec!["v1.0", "v2.10.1", "v2.9.0", "nightly"])
                .await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "lib.zip",
                build_zip(DEMO_FILES),
                UploadFields {
                    upstream_url: Some("https://github.com/acme/lib"),
                    ..Default::default()
                },
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["version"], "2.10.1");
    }

    #[tokio::test]
    async fn name_collisions_get_suffixes() {
        let app = TestApp::spawn().await;

        let names = [
            app.create_project("demo.zip", DEMO_FILES).await,
            app.create_project("demo.zip", DEMO_FILES).await,
            app.create_project("demo.zip", DEMO_FILES).await,
        ];

        assert_eq!(names, ["demo", "demo-1", "demo-2"]);
    }

    #[tokio::test]
    async fn rejects_invalid_archive() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "demo.zip",
                b"definitely not a zip".to_vec(),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_empty_archive() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "demo.zip",
                build_zip(&[]),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod project_auth {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "demo.zip",
                build_zip(DEMO_FILES),
                UploadFields::default(),
                None,
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "demo.zip",
                build_zip(DEMO_FILES),
                UploadFields::default(),
                Some("wrong"),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn management_disabled_without_configured_token() {
        let app = TestApp::spawn_with(None, Vec::new()).await;

        let res = app
            .upload(
                false,
                routes::PROJECTS,
                "demo.zip",
                build_zip(DEMO_FILES),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn reads_need_no_token() {
        let app = TestApp::spawn_with(None, Vec::new()).await;

        let res = app.get(routes::PROJECTS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, serde_json::json!([]));
    }
}

mod project_listing {
    use super::*;

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let app = TestApp::spawn().await;
        app.create_project("zeta.zip", DEMO_FILES).await;
        app.create_project("alpha.zip", DEMO_FILES).await;

        let res = app.get(routes::PROJECTS).await;

        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn project_without_metadata_is_listed_with_defaults() {
        let app = TestApp::spawn().await;
        let dir = app.projects_dir.join("manual");
        std::fs::create_dir_all(dir.join("src/main")).unwrap();
        std::fs::write(dir.join(".project.json"), "{ not json").unwrap();

        let res = app.get(&routes::project("manual")).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["version"], "1.0.0");
        assert!(res.body["sourceRootRelativePath"].is_null());
        assert!(res.body["originalFilename"].is_null());
    }

    #[tokio::test]
    async fn unknown_project_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::project("ghost")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod project_update {
    use super::*;

    #[tokio::test]
    async fn update_replaces_content_and_keeps_metadata() {
        let app = TestApp::spawn().await;
        let name = app.create_project("demo-v1.2.3.zip", DEMO_FILES).await;

        let res = app
            .upload(
                true,
                &routes::project(&name),
                "snapshot.zip",
                build_zip(&[("src/main/Bar.java", "class Bar {}")]),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["version"], "1.2.3");
        assert_eq!(res.body["sourceRootRelativePath"], "src/main");
        assert_eq!(res.body["originalFilename"], "snapshot.zip");

        let project_dir = app.projects_dir.join(&name);
        assert!(!project_dir.join("demo").exists());
        assert!(project_dir.join("src/main/Bar.java").exists());
        assert!(project_dir.join(".project.json").exists());
    }

    #[tokio::test]
    async fn update_with_new_filename_version() {
        let app = TestApp::spawn().await;
        let name = app.create_project("demo-v1.2.3.zip", DEMO_FILES).await;

        let res = app
            .upload(
                true,
                &routes::project(&name),
                "demo-v1.3.0.zip",
                build_zip(DEMO_FILES),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["version"], "1.3.0");
    }

    #[tokio::test]
    async fn update_unknown_project_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                true,
                &routes::project("ghost"),
                "ghost.zip",
                build_zip(DEMO_FILES),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn update_cannot_rename() {
        let app = TestApp::spawn().await;
        let name = app.create_project("demo.zip", DEMO_FILES).await;

        let res = app
            .upload(
                true,
                &routes::project(&name),
                "demo.zip",
                build_zip(DEMO_FILES),
                UploadFields {
                    name: Some("other"),
                    ..Default::default()
                },
                Some(ADMIN_TOKEN),
            )
            .await;

        assert_eq!(res.status, 400);
    }
}

mod project_deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_project() {
        let app = TestApp::spawn().await;
        let name = app.create_project("demo.zip", DEMO_FILES).await;

        let res = app
            .delete_with_token(&routes::project(&name), ADMIN_TOKEN)
            .await;
        assert_eq!(res.status, 204);

        let res = app.get(&routes::project(&name)).await;
        assert_eq!(res.status, 404);
        assert!(!app.projects_dir.join(&name).exists());
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .delete_with_token(&routes::project("ghost"), ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 404);
    }
}
