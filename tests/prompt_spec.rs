use plan_mcp::models::*;
use plan_mcp::prompts::{build_prompt, persona};
use speculate2::speculate;

fn plan(description: &str) -> ToolRequest {
    ToolRequest::PlanProject(PlanProjectRequest {
        description: description.to_string(),
        ..Default::default()
    })
}

fn review(code: &str) -> ReviewCodeRequest {
    ReviewCodeRequest {
        code: code.to_string(),
        language: "python".to_string(),
        ..Default::default()
    }
}

speculate! {
    describe "plan_project" {
        it "omits sections for empty optional fields" {
            let prompt = build_prompt(&plan("build a REST API"));

            assert!(prompt.contains("Project Description: build a REST API"));
            assert!(!prompt.contains("Requirements:"));
            assert!(!prompt.contains("Constraints:"));
            assert!(!prompt.contains("Technology Stack:"));
        }

        it "includes every provided field verbatim" {
            let request = ToolRequest::PlanProject(PlanProjectRequest {
                description: "An inventory service".to_string(),
                requirements: vec!["track stock levels".to_string(), "export CSV".to_string()],
                constraints: vec!["ship in 6 weeks".to_string()],
                tech_stack: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            });
            let prompt = build_prompt(&request);

            assert!(prompt.contains("Requirements:\n- track stock levels\n- export CSV"));
            assert!(prompt.contains("Constraints:\n- ship in 6 weeks"));
            assert!(prompt.contains("Technology Stack: Rust, PostgreSQL"));
        }

        it "starts with the planner persona and ends with the schema" {
            let prompt = build_prompt(&plan("a todo app"));

            assert!(prompt.starts_with(persona(OperationKind::PlanProject)));
            assert!(prompt.contains("```json"));
            assert!(prompt.contains("\"project_name\""));
            assert!(prompt.contains("\"phases\""));
        }

        it "is deterministic" {
            let request = plan("a chat bot");
            assert_eq!(build_prompt(&request), build_prompt(&request));
        }
    }

    describe "review_code" {
        it "fences the code in the requested language" {
            let prompt = build_prompt(&ToolRequest::ReviewCode(review("def f():\n    return 1")));

            assert!(prompt.contains("Please review the following python code:"));
            assert!(prompt.contains("```python\ndef f():\n    return 1\n```"));
            assert!(!prompt.contains("Context:"));
            assert!(!prompt.contains("Focus Areas:"));
        }

        it "adds context and focus areas when given" {
            let request = ReviewCodeRequest {
                context: Some("payment handler".to_string()),
                focus_areas: vec!["security".to_string()],
                ..review("x = 1")
            };
            let prompt = build_prompt(&ToolRequest::ReviewCode(request));

            assert!(prompt.contains("Context: payment handler"));
            assert!(prompt.contains("Focus Areas:\n- security"));
            assert!(!prompt.contains("This is a revision."));
        }

        it "carries previous feedback on a re-review" {
            let request = ReviewCodeRequest {
                previous_feedback: Some("rename f".to_string()),
                ..review("def g(): pass")
            };
            let prompt = build_prompt(&ToolRequest::ReviewCode(request));

            assert!(prompt.contains("This is a revision. Previous feedback:\nrename f"));
        }

        it "uses a longer fence when the code contains backticks" {
            let prompt = build_prompt(&ToolRequest::ReviewCode(review("s = \"```\"")));
            assert!(prompt.contains("````python\ns = \"```\"\n````"));
        }
    }

    describe "analyze_execution" {
        it "renders output and errors" {
            let request = ToolRequest::AnalyzeExecution(AnalyzeExecutionRequest {
                code: "print(1/0)".to_string(),
                execution_output: "Traceback".to_string(),
                expected_behavior: Some("print infinity".to_string()),
                error_messages: vec!["ZeroDivisionError".to_string()],
                language: "python".to_string(),
                previous_attempts: vec![],
            });
            let prompt = build_prompt(&request);

            assert!(prompt.contains("Expected Behavior: print infinity"));
            assert!(prompt.contains("Code (python):"));
            assert!(prompt.contains("Execution Output:\n```\nTraceback\n```"));
            assert!(prompt.contains("Error Messages:\n- ZeroDivisionError"));
            assert!(prompt.contains("\"root_cause\""));
        }

        it "skips the expected behavior section when absent" {
            let request = ToolRequest::AnalyzeExecution(AnalyzeExecutionRequest {
                code: "main()".to_string(),
                execution_output: "ok".to_string(),
                language: "python".to_string(),
                ..Default::default()
            });
            let prompt = build_prompt(&request);

            assert!(!prompt.contains("Expected Behavior:"));
            assert!(!prompt.contains("Error Messages:"));
            assert!(!prompt.contains("Previous Attempts:"));
        }

        it "numbers previous attempts" {
            let request = ToolRequest::AnalyzeExecution(AnalyzeExecutionRequest {
                code: "main()".to_string(),
                execution_output: "still failing".to_string(),
                language: "python".to_string(),
                previous_attempts: vec!["added a retry".to_string(), "raised the timeout".to_string()],
                ..Default::default()
            });
            let prompt = build_prompt(&request);

            assert!(prompt.contains(
                "Previous Attempts:\n\nAttempt 1:\nadded a retry\n\nAttempt 2:\nraised the timeout"
            ));
        }
    }

    describe "refine_plan" {
        it "shows the current plan and feedback to the planner" {
            let request = ToolRequest::RefinePlan(RefinePlanRequest {
                current_plan: "{\n  \"project_name\": \"Blog\"\n}".to_string(),
                feedback: "merge the last two phases".to_string(),
                additional_context: Some("team of two".to_string()),
            });
            let prompt = build_prompt(&request);

            assert!(prompt.starts_with(persona(OperationKind::PlanProject)));
            assert!(prompt.contains("Current Project Plan:\n{\n  \"project_name\": \"Blog\"\n}"));
            assert!(prompt.contains("Feedback:\nmerge the last two phases"));
            assert!(prompt.contains("Additional Context: team of two"));
            assert!(prompt.contains("maintaining its overall structure and quality"));
            assert!(prompt.contains("\"phases\""));
        }
    }

    describe "debug_error" {
        it "renders the error and optional trace" {
            let request = ToolRequest::DebugError(DebugErrorRequest {
                code: "items[3]".to_string(),
                error_message: "IndexError: list index out of range".to_string(),
                stack_trace: Some("File \"app.py\", line 1".to_string()),
                language: "python".to_string(),
                context: None,
            });
            let prompt = build_prompt(&request);

            assert!(prompt.starts_with(persona(OperationKind::AnalyzeExecution)));
            assert!(prompt.contains("Debug this python error:"));
            assert!(prompt.contains("Code:\n```python\nitems[3]\n```"));
            assert!(prompt.contains("Error Message:\nIndexError: list index out of range"));
            assert!(prompt.contains("Stack Trace:\n```\nFile \"app.py\", line 1\n```"));
            assert!(!prompt.contains("Context:"));
            assert!(prompt.contains("\"root_cause\""));
        }
    }

    describe "compare_implementations" {
        it "fences both implementations and lists the criteria" {
            let request = ToolRequest::CompareImplementations(CompareImplementationsRequest {
                code1: "sum(xs)".to_string(),
                code2: "reduce(add, xs)".to_string(),
                language: "python".to_string(),
                comparison_criteria: vec!["speed".to_string(), "clarity".to_string()],
            });
            let prompt = build_prompt(&request);

            assert!(prompt.starts_with(persona(OperationKind::ReviewCode)));
            assert!(prompt.contains("Compare these two python implementations:"));
            assert!(prompt.contains("Implementation 1:\n```python\nsum(xs)\n```"));
            assert!(prompt.contains("Implementation 2:\n```python\nreduce(add, xs)\n```"));
            assert!(prompt.contains("Comparison Criteria: speed, clarity"));
            assert!(prompt.contains("5. Recommendation on which to use and why"));
            assert!(prompt.contains("\"recommendation\""));
        }
    }

    describe "review_directory" {
        it "embeds the rendered contents and patterns" {
            let request = ToolRequest::ReviewDirectory(ReviewDirectoryRequest {
                directory_path: "/srv/app".to_string(),
                contents: "--- main.rs ---\nfn main() {}\n".to_string(),
                include_patterns: vec!["*.rs".to_string()],
                ..Default::default()
            });
            let prompt = build_prompt(&request);

            assert!(prompt.contains("Please review the project in directory /srv/app."));
            assert!(prompt.contains("Included patterns: *.rs"));
            assert!(!prompt.contains("Excluded patterns:"));
            assert!(prompt.contains("--- main.rs ---\nfn main() {}"));
        }
    }

    describe "generated artifacts" {
        it "asks for a markdown block for docs" {
            let request = ToolRequest::GenerateDocs(GenerateDocsRequest {
                code: "fn add(a: i32, b: i32) -> i32 { a + b }".to_string(),
                language: "rust".to_string(),
                doc_style: Some("rustdoc".to_string()),
                context: None,
            });
            let prompt = build_prompt(&request);

            assert!(prompt.contains("Documentation style: rustdoc"));
            assert!(prompt.contains("```markdown"));
            assert!(!prompt.contains("JSON schema"));
        }

        it "asks for a block in the source language for tests" {
            let request = ToolRequest::GenerateTests(GenerateTestsRequest {
                code: "def add(a, b): return a + b".to_string(),
                language: "python".to_string(),
                test_framework: Some("pytest".to_string()),
                context: None,
            });
            let prompt = build_prompt(&request);

            assert!(prompt.contains("Test framework: pytest"));
            assert!(prompt.contains("fenced ```python block"));
        }
    }
}
