use famgraph_core::{FamGraphError, Result, TenantId};
use once_cell::sync::Lazy;
use regex::Regex;

/// Few-shot examples teaching the model the projection style we expect.
const FEW_SHOT_EXAMPLES: &str = r#"
## Example 1:
Question: "How many tasks did Stefan create last week?"
Cypher:
MATCH (p:Person {name: 'Stefan', tenantId: $tenantId})-[:CREATED]->(t:Task)
WHERE datetime(t.createdAt) >= datetime() - duration({days: 7})
RETURN p.name AS person, count(t) AS taskCount

## Example 2:
Question: "Who creates the most tasks on Sundays?"
Cypher:
MATCH (p:Person {tenantId: $tenantId})-[:CREATED]->(t:Task)
WHERE datetime(t.createdAt).dayOfWeek = 7
WITH p, count(t) AS taskCount
RETURN p.name AS person, taskCount
ORDER BY taskCount DESC
LIMIT 1

## Example 3:
Question: "What tasks are monitored by Maria?"
Cypher:
MATCH (p:Person {name: 'Maria', tenantId: $tenantId})-[:MONITORS]->(t:Task)
RETURN t.title AS task, t.category AS category, t.createdAt AS created
LIMIT 100

## Example 4:
Question: "Show me all parents in the family"
Cypher:
MATCH (p:Person {tenantId: $tenantId})
WHERE p.role = 'parent'
RETURN p.name AS person, p.role AS role
"#;

fn schema_description(tenant: &TenantId) -> String {
    format!(
        r#"# Graph Schema

## Node Types:
- Person: {{userId, name, role, tenantId, cognitiveLoad}}
- Task: {{taskId, title, category, tenantId, createdAt, cognitiveLoad}}
- Event: {{eventId, title, startTime, tenantId}}
- Responsibility: {{cardName, category, minimumStandard}}

## Relationship Types:
- (Person)-[:CREATED]->(Task)
- (Person)-[:ANTICIPATES]->(Task)
- (Person)-[:MONITORS]->(Task)
- (Person)-[:EXECUTES]->(Task)
- (Person)-[:OWNS]->(Responsibility)
- (Task)-[:BELONGS_TO]->(Responsibility)
- (Person)-[:PARENT_OF]->(Person)

## Tenant ID:
All queries must filter by tenantId: "{tenant}"
"#
    )
}

/// Build the prompt that turns a free-text question into a Cypher query.
pub fn build_generation_prompt(question: &str, tenant: &TenantId) -> String {
    format!(
        r#"You are a Cypher query generator for a graph database. Convert the natural language question to a Cypher query.

{schema}
{examples}
Now generate a Cypher query for this question:
Question: "{question}"

Requirements:
1. ALWAYS filter by tenantId: "{tenant}"
2. Return results as simple scalar projections (not raw node objects)
3. Use clear property names in the RETURN clause
4. Handle null values gracefully
5. Limit results to 100 records max
6. **CRITICAL:** Use ONLY read operations (MATCH, WHERE, RETURN). DO NOT use CREATE, DELETE, DETACH, REMOVE, SET, or MERGE

Return ONLY the Cypher query, no explanation or markdown formatting."#,
        schema = schema_description(tenant),
        examples = FEW_SHOT_EXAMPLES,
    )
}

// Write operations are forbidden in generated queries. Word boundaries keep
// property names such as `createdAt` from tripping the check.
static FORBIDDEN_OPERATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bDELETE\b",
        r"(?i)\bDETACH\s+DELETE\b",
        r"(?i)\bREMOVE\b",
        r"(?i)\bSET\b",
        r"(?i)\bCREATE\b",
        r"(?i)\bMERGE\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static LIMIT_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLIMIT\b").unwrap());

/// Validate and clean a generated Cypher query before it touches the store.
///
/// Strips markdown fences, requires the tenant filter, rejects write
/// operations, and caps the result set. Returns the cleaned query.
pub fn validate_query(cypher: &str) -> Result<String> {
    let mut cleaned = cypher
        .replace("```cypher", "")
        .replace("```", "")
        .trim()
        .to_string();

    if !cleaned.contains("tenantId") {
        return Err(FamGraphError::QueryValidation(
            "generated query missing tenant filter".to_string(),
        ));
    }

    for pattern in FORBIDDEN_OPERATIONS.iter() {
        if pattern.is_match(&cleaned) {
            return Err(FamGraphError::QueryValidation(format!(
                "generated query contains forbidden operation: {}",
                pattern.as_str()
            )));
        }
    }

    if !LIMIT_CLAUSE.is_match(&cleaned) {
        cleaned.push_str("\nLIMIT 100");
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markdown_fences() {
        let raw = "```cypher\nMATCH (p:Person {tenantId: $tenantId}) RETURN p.name LIMIT 10\n```";
        let cleaned = validate_query(raw).unwrap();
        assert!(!cleaned.contains("```"));
        assert!(cleaned.starts_with("MATCH"));
    }

    #[test]
    fn test_rejects_missing_tenant_filter() {
        let err = validate_query("MATCH (p:Person) RETURN p.name").unwrap_err();
        assert!(matches!(err, FamGraphError::QueryValidation(_)));
        assert!(err.to_string().contains("tenant filter"));
    }

    #[test]
    fn test_rejects_write_operations() {
        for cypher in [
            "MATCH (p:Person {tenantId: $tenantId}) DELETE p",
            "MATCH (p:Person {tenantId: $tenantId}) DETACH DELETE p",
            "MATCH (p:Person {tenantId: $tenantId}) REMOVE p.name RETURN p",
            "MATCH (p:Person {tenantId: $tenantId}) SET p.name = 'x' RETURN p",
            "CREATE (p:Person {tenantId: $tenantId}) RETURN p",
            "MERGE (p:Person {tenantId: $tenantId}) RETURN p",
            "match (p:Person {tenantId: $tenantId}) delete p",
        ] {
            assert!(validate_query(cypher).is_err(), "accepted: {cypher}");
        }
    }

    #[test]
    fn test_allows_created_at_property() {
        // `createdAt` must not trip the CREATE check.
        let cypher =
            "MATCH (p:Person {tenantId: $tenantId})-[:CREATED]->(t:Task) RETURN t.createdAt";
        let cleaned = validate_query(cypher).unwrap();
        assert!(cleaned.contains("createdAt"));
    }

    #[test]
    fn test_appends_limit_when_absent() {
        let cleaned =
            validate_query("MATCH (p:Person {tenantId: $tenantId}) RETURN p.name").unwrap();
        assert!(cleaned.ends_with("LIMIT 100"));
    }

    #[test]
    fn test_keeps_existing_limit() {
        let cleaned =
            validate_query("MATCH (p:Person {tenantId: $tenantId}) RETURN p.name LIMIT 5").unwrap();
        assert!(cleaned.ends_with("LIMIT 5"));
    }

    #[test]
    fn test_prompt_includes_tenant_and_schema() {
        let tenant = TenantId::from("family-123");
        let prompt = build_generation_prompt("who is tired?", &tenant);
        assert!(prompt.contains("family-123"));
        assert!(prompt.contains("ANTICIPATES"));
        assert!(prompt.contains("ONLY read operations"));
    }
}
