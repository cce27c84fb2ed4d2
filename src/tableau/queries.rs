//! Metadata API GraphQL documents

/// Columns of one table, selected by the `$luid` variable
pub const COLUMNS_QUERY: &str = r"query getColumns($luid: String!) {
    databaseTables(filter: {luid: $luid}) {
        columns {
            name
            id
            description
            luid
            remoteType
            isNullable
        }
    }
}";

/// Snowflake databases named in `names`, with their tables
pub fn databases_query(names: &[String]) -> String {
    // A JSON string array is also a valid GraphQL list literal
    let names = serde_json::to_string(names).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"query get_databases {{
    databases(filter: {{connectionType: "snowflake", nameWithin: {names}}}) {{
        name
        id
        tables {{
            name
            schema
            id
            luid
            fullName
        }}
    }}
}}"#
    )
}

/// Workbooks downstream of the table with `luid`
pub fn downstream_workbooks_query(luid: &str) -> String {
    let luid = serde_json::to_string(luid).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r"query get_downstream_workbooks {{
    databaseTables(filter: {{luid: {luid}}}) {{
        name
        id
        luid
        downstreamWorkbooks {{
            id
            luid
            name
            description
            projectName
            vizportalUrlId
            tags {{
                id
                name
            }}
            owner {{
                id
                name
                username
            }}
            upstreamTables {{
                id
                luid
                name
            }}
        }}
    }}
}}"
    )
}
