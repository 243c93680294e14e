//! SQL schema for the scheduling tables, mirroring the upstream
//! producer's `job` / `task` / `resource` / `resource_group` /
//! `resource_group_association` / `calendar` / `schedule` tables.

pub(crate) const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS job (
    id INTEGER PRIMARY KEY,
    job_number TEXT NOT NULL UNIQUE,
    quantity INTEGER NOT NULL DEFAULT 1,
    completed INTEGER NOT NULL DEFAULT 0,
    blocked INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS task (
    id INTEGER PRIMARY KEY,
    job_number TEXT NOT NULL,
    task_number TEXT NOT NULL,
    setup_time INTEGER NOT NULL DEFAULT 0,
    time_each INTEGER NOT NULL DEFAULT 0,
    predecessors TEXT NOT NULL DEFAULT '',
    resources TEXT NOT NULL DEFAULT '',
    completed INTEGER NOT NULL DEFAULT 0,
    UNIQUE(job_number, task_number)
);

CREATE TABLE IF NOT EXISTS resource (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resource_group (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS resource_group_association (
    group_id INTEGER NOT NULL REFERENCES resource_group(id),
    resource_id INTEGER NOT NULL REFERENCES resource(id),
    PRIMARY KEY (group_id, resource_id)
);

CREATE TABLE IF NOT EXISTS calendar (
    weekday INTEGER PRIMARY KEY,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schedule (
    task_number TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    resources_used TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_task_job_number ON task(job_number);
CREATE INDEX IF NOT EXISTS idx_resource_group_association_group ON resource_group_association(group_id);
"#;
