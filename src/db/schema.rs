//! Schema bootstrap
//!
//! Creates the portal tables and indexes idempotently at startup.

use deadpool_postgres::Pool;
use tracing::info;

/// Create database tables if they don't exist
pub async fn create_tables(pool: &Pool) -> anyhow::Result<()> {
    let client = pool.get().await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                email VARCHAR(255) UNIQUE NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'public',
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS faculty (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                designation VARCHAR(255),
                department VARCHAR(255),
                specialization TEXT,
                bio TEXT,
                email VARCHAR(255),
                profile_image TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS research_projects (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                principal_investigator VARCHAR(255),
                co_principal_investigator VARCHAR(255),
                department VARCHAR(255),
                funding_agency VARCHAR(255),
                agency_scientist VARCHAR(255),
                file_number VARCHAR(255),
                sanctioned_amount DOUBLE PRECISION,
                start_date DATE,
                end_date DATE,
                objectives TEXT,
                deliverables TEXT,
                outcomes TEXT,
                pdf_url TEXT,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS publications (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                journal_name TEXT,
                publication_type VARCHAR(50),
                year INTEGER,
                indexing VARCHAR(100),
                national_international VARCHAR(50),
                department VARCHAR(255),
                faculty_id INTEGER REFERENCES faculty(id),
                pdf_url TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS patents (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                patent_number VARCHAR(255),
                inventors TEXT,
                department VARCHAR(255),
                status VARCHAR(50),
                filing_date DATE,
                grant_date DATE,
                description TEXT,
                faculty_id INTEGER REFERENCES faculty(id),
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS ipr (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                ipr_type VARCHAR(50),
                application_number VARCHAR(255),
                status VARCHAR(50),
                filing_date DATE,
                publication_date DATE,
                grant_date DATE,
                inventors TEXT,
                faculty_id INTEGER REFERENCES faculty(id),
                department VARCHAR(255),
                description TEXT,
                pdf_url TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS ip_assets (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                type VARCHAR(50),
                owner VARCHAR(255),
                inventors TEXT,
                department VARCHAR(255),
                filing_year INTEGER,
                filing_date DATE,
                published_date DATE,
                granted_date DATE,
                expiry_date DATE,
                status VARCHAR(50),
                application_number VARCHAR(255),
                registration_number VARCHAR(255),
                description TEXT,
                pdf_url TEXT,
                commercialized BOOLEAN DEFAULT FALSE,
                faculty_id INTEGER REFERENCES faculty(id),
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS consultancy (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                faculty_id INTEGER REFERENCES faculty(id),
                client_name VARCHAR(255),
                department VARCHAR(255),
                amount_earned DOUBLE PRECISION,
                start_date DATE,
                end_date DATE,
                status VARCHAR(50),
                description TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS research_labs (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                department VARCHAR(255),
                head VARCHAR(255),
                description TEXT,
                focus_areas TEXT[],
                established_year INTEGER,
                image_url TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS research_centers (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                head VARCHAR(255),
                department VARCHAR(255),
                established_year INTEGER,
                focus_areas TEXT[],
                facilities TEXT,
                image_url TEXT,
                website_url TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS teaching_materials (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                material_type VARCHAR(50),
                file_url TEXT,
                video_link TEXT,
                faculty_id INTEGER REFERENCES faculty(id),
                course_name VARCHAR(255),
                department VARCHAR(255),
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS awards (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                faculty_id INTEGER REFERENCES faculty(id),
                award_type VARCHAR(100),
                awarded_by VARCHAR(255),
                year INTEGER,
                date_received DATE,
                description TEXT,
                certificate_url TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS student_projects (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                faculty_id INTEGER REFERENCES faculty(id),
                student_names TEXT,
                department VARCHAR(255),
                project_type VARCHAR(50),
                academic_year VARCHAR(20),
                abstract TEXT,
                pdf_url TEXT,
                created_by INTEGER REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    // Indexes for the common filter columns
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_publications_faculty_id ON publications(faculty_id)",
        "CREATE INDEX IF NOT EXISTS idx_publications_year ON publications(year)",
        "CREATE INDEX IF NOT EXISTS idx_patents_faculty_id ON patents(faculty_id)",
        "CREATE INDEX IF NOT EXISTS idx_ipr_filing_date ON ipr(filing_date)",
        "CREATE INDEX IF NOT EXISTS idx_research_projects_department ON research_projects(department)",
        "CREATE INDEX IF NOT EXISTS idx_research_projects_start_date ON research_projects(start_date)",
        "CREATE INDEX IF NOT EXISTS idx_consultancy_start_date ON consultancy(start_date)",
        "CREATE INDEX IF NOT EXISTS idx_teaching_materials_faculty_id ON teaching_materials(faculty_id)",
    ] {
        let _ = client.execute(statement, &[]).await;
    }

    info!("Database tables initialized");
    Ok(())
}
